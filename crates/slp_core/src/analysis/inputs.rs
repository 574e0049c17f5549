//! # Controller Input Tally
//!
//! Counts discrete controller activity per player: rising button edges,
//! stick region changes, analog trigger presses, and raw joystick travel.
//! One tally accumulates per ordered pair for the pair's attacking player.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::frames::FrameAggregator;
use crate::models::action_state::FIRST_PLAYABLE_FRAME;
use crate::models::frame::{FrameEntry, PreFrame};
use crate::models::settings::PlayerIndexedPair;
use crate::pipeline::StatComputer;

/// Buttons considered for digital input counting (the 12 physical bits).
pub const BUTTON_MASK: u16 = 0x0fff;

/// Per-axis deflection needed to leave the stick dead zone.
pub const STICK_REGION_THRESHOLD: f32 = 0.2875;

/// Analog trigger depth that registers as a press.
pub const TRIGGER_THRESHOLD: f32 = 0.3;

/// Per-frame joystick travel below this is sensor noise, not motion.
pub const MOTION_NOISE_THRESHOLD: f32 = 0.001;

/// Discretized analog-stick deflection zone: the dead zone or one of eight
/// directions. Diagonal octants win over cardinals when both axes clear the
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickRegion {
    DeadZone,
    NE,
    SE,
    SW,
    NW,
    N,
    E,
    S,
    W,
}

/// Classify a stick reading into its region.
pub fn stick_region(x: f32, y: f32) -> StickRegion {
    let t = STICK_REGION_THRESHOLD;
    if x >= t && y >= t {
        StickRegion::NE
    } else if x >= t && y <= -t {
        StickRegion::SE
    } else if x <= -t && y <= -t {
        StickRegion::SW
    } else if x <= -t && y >= t {
        StickRegion::NW
    } else if y >= t {
        StickRegion::N
    } else if x >= t {
        StickRegion::E
    } else if y <= -t {
        StickRegion::S
    } else if x <= -t {
        StickRegion::W
    } else {
        StickRegion::DeadZone
    }
}

/// Cumulative controller-activity tally for one ordered pair. Counters only
/// ever increase over a match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerInputs {
    pub player_index: u8,
    pub opponent_index: u8,
    /// Sum of the four category counts.
    pub input_count: u32,
    pub joystick_input_count: u32,
    pub cstick_input_count: u32,
    pub button_input_count: u32,
    pub trigger_input_count: u32,
    /// Total joystick travel in unit coordinates.
    pub joystick_distance_traveled: f32,
    /// Frames on which the joystick moved more than sensor noise.
    pub joystick_motion_frame_count: u32,
}

impl PlayerInputs {
    fn new(pair: PlayerIndexedPair) -> Self {
        Self {
            player_index: pair.player,
            opponent_index: pair.opponent,
            input_count: 0,
            joystick_input_count: 0,
            cstick_input_count: 0,
            button_input_count: 0,
            trigger_input_count: 0,
            joystick_distance_traveled: 0.0,
            joystick_motion_frame_count: 0,
        }
    }
}

/// Per-pair input tally engine. Frames before the first playable frame are
/// ignored, as is any frame without a real predecessor.
#[derive(Debug)]
pub struct InputComputer {
    pairs: Vec<PlayerIndexedPair>,
    state: FxHashMap<PlayerIndexedPair, PlayerInputs>,
}

impl InputComputer {
    pub fn new(pairs: &[PlayerIndexedPair]) -> Self {
        let state = pairs.iter().map(|&pair| (pair, PlayerInputs::new(pair))).collect();
        Self { pairs: pairs.to_vec(), state }
    }

    /// Current tallies, one per ordered pair, in pair order.
    pub fn tallies(&self) -> Vec<PlayerInputs> {
        self.pairs.iter().filter_map(|pair| self.state.get(pair).copied()).collect()
    }
}

impl StatComputer for InputComputer {
    fn process_frame(&mut self, frame: &FrameEntry, frames: &FrameAggregator) {
        for i in 0..self.pairs.len() {
            let pair = self.pairs[i];
            if let Some(tally) = self.state.get_mut(&pair) {
                tally_frame(tally, frame, frames, pair.player);
            }
        }
    }
}

fn tally_frame(tally: &mut PlayerInputs, frame: &FrameEntry, frames: &FrameAggregator, slot: u8) {
    if frame.frame < FIRST_PLAYABLE_FRAME {
        // Inputs during the pre-match countdown do nothing.
        return;
    }
    let previous = match frames.get(frame.frame - 1).and_then(|entry| entry.pre_record(slot)) {
        Some(previous) => previous,
        None => return,
    };
    let current = frame.pre(slot);

    tally_buttons(tally, &current, &previous);
    tally_sticks(tally, &current, &previous);
    tally_triggers(tally, &current, &previous);
    tally_motion(tally, &current, &previous);
}

/// Rising edges under the physical button mask, one input per new bit.
fn tally_buttons(tally: &mut PlayerInputs, current: &PreFrame, previous: &PreFrame) {
    let changes = !previous.physical_buttons() & current.physical_buttons() & BUTTON_MASK;
    let pressed = changes.count_ones();
    tally.button_input_count += pressed;
    tally.input_count += pressed;
}

/// Region-to-region stick movement. Settling back into the dead zone is
/// free; every other region change costs one input.
fn tally_sticks(tally: &mut PlayerInputs, current: &PreFrame, previous: &PreFrame) {
    let (x, y) = current.joystick();
    let (px, py) = previous.joystick();
    let region = stick_region(x, y);
    if region != stick_region(px, py) && region != StickRegion::DeadZone {
        tally.joystick_input_count += 1;
        tally.input_count += 1;
    }

    let (cx, cy) = current.cstick();
    let (pcx, pcy) = previous.cstick();
    let cregion = stick_region(cx, cy);
    if cregion != stick_region(pcx, pcy) && cregion != StickRegion::DeadZone {
        tally.cstick_input_count += 1;
        tally.input_count += 1;
    }
}

/// Upward threshold crossings, independent per trigger side.
fn tally_triggers(tally: &mut PlayerInputs, current: &PreFrame, previous: &PreFrame) {
    if previous.left_trigger() < TRIGGER_THRESHOLD && current.left_trigger() >= TRIGGER_THRESHOLD {
        tally.trigger_input_count += 1;
        tally.input_count += 1;
    }
    if previous.right_trigger() < TRIGGER_THRESHOLD && current.right_trigger() >= TRIGGER_THRESHOLD
    {
        tally.trigger_input_count += 1;
        tally.input_count += 1;
    }
}

/// Raw joystick travel between consecutive polls, for motion-share metrics
/// downstream.
fn tally_motion(tally: &mut PlayerInputs, current: &PreFrame, previous: &PreFrame) {
    let (x, y) = current.joystick();
    let (px, py) = previous.joystick();
    let dx = x - px;
    let dy = y - py;
    let distance = (dx * dx + dy * dy).sqrt();
    tally.joystick_distance_traveled += distance;
    if distance > MOTION_NOISE_THRESHOLD {
        tally.joystick_motion_frame_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::frame::{FrameUpdate, PostFrame};
    use crate::models::settings::{MatchSettings, PlayerMeta, PlayerType};
    use proptest::prelude::*;

    fn pairs() -> Vec<PlayerIndexedPair> {
        vec![
            PlayerIndexedPair { player: 0, opponent: 1 },
            PlayerIndexedPair { player: 1, opponent: 0 },
        ]
    }

    fn settings() -> MatchSettings {
        MatchSettings::new(
            None,
            vec![
                PlayerMeta { slot: 0, character_id: 2, player_type: PlayerType::Human },
                PlayerMeta { slot: 1, character_id: 9, player_type: PlayerType::Human },
            ],
        )
    }

    struct Harness {
        computer: InputComputer,
        aggregator: FrameAggregator,
        settings: MatchSettings,
        next_frame: i32,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                computer: InputComputer::new(&pairs()),
                aggregator: FrameAggregator::new(),
                settings: settings(),
                next_frame: 0,
            }
        }

        /// Feed one frame where slot 0 has the given controller state and
        /// slot 1 stays neutral.
        fn step(&mut self, pre: PreFrame) {
            let frame = self.next_frame;
            self.next_frame += 1;
            for slot in 0..2u8 {
                let payload = if slot == 0 { pre } else { PreFrame::default() };
                self.aggregator.ingest(&FrameUpdate::pre(frame, slot, payload), &mut self.settings);
                self.aggregator
                    .ingest(&FrameUpdate::post(frame, slot, PostFrame::default()), &mut self.settings);
            }
            let entry = self.aggregator.frame(frame);
            self.computer.process_frame(&entry, &self.aggregator);
        }

        fn tally(&self) -> PlayerInputs {
            self.computer.tallies()[0]
        }
    }

    fn buttons(bits: u16) -> PreFrame {
        PreFrame { buttons: Some(bits), ..PreFrame::default() }
    }

    fn joystick(x: f32, y: f32) -> PreFrame {
        PreFrame { joystick_x: Some(x), joystick_y: Some(y), ..PreFrame::default() }
    }

    fn left_trigger(value: f32) -> PreFrame {
        PreFrame { trigger_l: Some(value), ..PreFrame::default() }
    }

    #[test]
    fn region_classification_prefers_diagonals() {
        assert_eq!(stick_region(0.0, 0.0), StickRegion::DeadZone);
        assert_eq!(stick_region(0.28, 0.0), StickRegion::DeadZone);
        assert_eq!(stick_region(0.2875, 0.2875), StickRegion::NE);
        assert_eq!(stick_region(0.5, -0.5), StickRegion::SE);
        assert_eq!(stick_region(-0.5, -0.5), StickRegion::SW);
        assert_eq!(stick_region(-0.5, 0.5), StickRegion::NW);
        assert_eq!(stick_region(0.0, 0.5), StickRegion::N);
        assert_eq!(stick_region(0.5, 0.0), StickRegion::E);
        assert_eq!(stick_region(0.0, -0.5), StickRegion::S);
        assert_eq!(stick_region(-0.5, 0.0), StickRegion::W);
    }

    #[test]
    fn two_new_buttons_count_as_two_inputs() {
        let mut h = Harness::new();
        h.step(buttons(0b000));
        h.step(buttons(0b101));

        let tally = h.tally();
        assert_eq!(tally.button_input_count, 2);
        assert_eq!(tally.input_count, 2);
    }

    #[test]
    fn held_buttons_do_not_recount() {
        let mut h = Harness::new();
        h.step(buttons(0b101));
        h.step(buttons(0b101));
        h.step(buttons(0b111));

        // Frame 0 has no predecessor, frame 1 holds the same bits, frame 2
        // adds exactly one new bit.
        let tally = h.tally();
        assert_eq!(tally.button_input_count, 1);
    }

    #[test]
    fn bits_above_the_mask_are_ignored() {
        let mut h = Harness::new();
        h.step(buttons(0x0000));
        h.step(buttons(0xf000));

        assert_eq!(h.tally().button_input_count, 0);
        assert_eq!(h.tally().input_count, 0);
    }

    #[test]
    fn stick_region_change_counts_once_and_deadzone_return_is_free() {
        let mut h = Harness::new();
        h.step(joystick(0.0, 0.0));
        h.step(joystick(0.5, 0.5)); // DZ -> NE: counts
        h.step(joystick(0.0, 0.0)); // NE -> DZ: free

        let tally = h.tally();
        assert_eq!(tally.joystick_input_count, 1);
    }

    #[test]
    fn unchanged_region_does_not_count() {
        let mut h = Harness::new();
        h.step(joystick(0.5, 0.5));
        h.step(joystick(0.6, 0.4));
        h.step(joystick(0.45, 0.55));

        assert_eq!(h.tally().joystick_input_count, 0);
    }

    #[test]
    fn cstick_counts_into_its_own_category() {
        let mut h = Harness::new();
        h.step(PreFrame::default());
        h.step(PreFrame { cstick_y: Some(1.0), ..PreFrame::default() });

        let tally = h.tally();
        assert_eq!(tally.cstick_input_count, 1);
        assert_eq!(tally.joystick_input_count, 0);
        assert_eq!(tally.input_count, 1);
    }

    #[test]
    fn trigger_counts_each_upward_crossing() {
        let mut h = Harness::new();
        for value in [0.1, 0.35, 0.25, 0.31] {
            h.step(left_trigger(value));
        }

        let tally = h.tally();
        assert_eq!(tally.trigger_input_count, 2);
        assert_eq!(tally.input_count, 2);
    }

    #[test]
    fn triggers_count_independently_per_side() {
        let mut h = Harness::new();
        h.step(PreFrame::default());
        h.step(PreFrame { trigger_l: Some(0.8), trigger_r: Some(0.8), ..PreFrame::default() });

        assert_eq!(h.tally().trigger_input_count, 2);
    }

    #[test]
    fn joystick_travel_accumulates_and_flags_motion_frames() {
        let mut h = Harness::new();
        h.step(joystick(0.0, 0.0));
        h.step(joystick(0.3, 0.4)); // distance 0.5
        h.step(joystick(0.3, 0.4)); // no motion

        let tally = h.tally();
        assert!((tally.joystick_distance_traveled - 0.5).abs() < 1e-4);
        assert_eq!(tally.joystick_motion_frame_count, 1);
    }

    #[test]
    fn countdown_frames_are_ignored() {
        let mut h = Harness::new();
        h.next_frame = FIRST_PLAYABLE_FRAME - 3;
        h.step(buttons(0b000));
        h.step(buttons(0b111));
        assert_eq!(h.tally().input_count, 0);

        // Once playable, the same edge counts.
        h.next_frame = FIRST_PLAYABLE_FRAME;
        h.step(buttons(0b000));
        h.step(buttons(0b111));
        assert_eq!(h.tally().input_count, 3);
    }

    proptest! {
        /// The overall count always equals the sum of its categories, no
        /// matter what the controller does.
        #[test]
        fn input_count_is_category_sum(
            frames in prop::collection::vec(
                (any::<u16>(), -1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0, 0.0f32..1.0, 0.0f32..1.0),
                1..40,
            )
        ) {
            let mut h = Harness::new();
            for (bits, jx, jy, cx, cy, tl, tr) in frames {
                h.step(PreFrame {
                    joystick_x: Some(jx),
                    joystick_y: Some(jy),
                    cstick_x: Some(cx),
                    cstick_y: Some(cy),
                    trigger_l: Some(tl),
                    trigger_r: Some(tr),
                    buttons: Some(bits),
                });
            }
            let tally = h.tally();
            prop_assert_eq!(
                tally.input_count,
                tally.button_input_count
                    + tally.joystick_input_count
                    + tally.cstick_input_count
                    + tally.trigger_input_count
            );
        }
    }
}
