//! # Conversion Detection
//!
//! Detects continuous punish sequences ("conversions") one player lands on
//! the other and, in a deferred pass, classifies how each sequence opened.
//!
//! ## Algorithm
//! 1. Per attacker direction, open a conversion when the opponent enters a
//!    damaged or grabbed state.
//! 2. While open, fold positive damage deltas into per-move hit/damage
//!    totals, segmented by the attacker's last-hit animation marker.
//! 3. Close on stock loss, or once the opponent has stayed actionable for
//!    the punish-reset window.
//! 4. Deferred pass: group unresolved conversions by start frame and label
//!    them trade / counter-attack / neutral-win. Classification needs the
//!    opposite direction's future end frame, so it cannot run while
//!    streaming.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::frames::FrameAggregator;
use crate::models::action_state::{
    damage_taken, did_lose_stock, is_damaged, is_grabbed, is_in_control,
};
use crate::models::frame::FrameEntry;
use crate::models::settings::PlayerIndexedPair;
use crate::pipeline::StatComputer;

/// Frames the opponent must stay actionable before a conversion closes
/// (~0.75 s). A sequence opened at frame F with the opponent actionable from
/// F+1 onward closes at frame F+45.
pub const PUNISH_RESET_FRAMES: u32 = 45;

/// Margin behind the latest processed frame before an opening is safe to
/// classify. Both directions of a frame are processed together, so one frame
/// is enough for a simultaneous opposite-direction opening to be visible.
pub const OPENING_LOOKBACK_FRAMES: i32 = 1;

/// How a conversion began.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Opening {
    /// Not yet resolved, or never resolvable (stream ended too early).
    #[default]
    Unknown,
    /// First hit landed from neutral.
    NeutralWin,
    /// Landed while the opponent's own punish was still running.
    CounterAttack,
    /// Both directions opened on the same frame.
    Trade,
}

/// A single attack that connected within a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveLanded {
    /// Frame the move first connected.
    pub frame: i32,
    /// Attack id reported by the attacker's last-attack-landed field.
    pub move_id: u16,
    /// Hits credited to this move; multi-hit moves accumulate.
    pub hit_count: u32,
    /// Damage credited to this move.
    pub damage: f32,
}

/// A continuous punish sequence by one player against the other, from first
/// hit or grab to recovery or stock loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub player_index: u8,
    pub opponent_index: u8,
    pub start_frame: i32,
    /// None while the conversion is still open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_frame: Option<i32>,
    /// Opponent percent just before the opening hit.
    pub start_percent: f32,
    /// Opponent percent on the latest processed frame, frozen at its
    /// pre-loss value when the opponent loses a stock.
    pub current_percent: f32,
    /// Opponent percent on the frame before the close; a stock loss resets
    /// percent to zero on the closing frame itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_percent: Option<f32>,
    pub moves: Vec<MoveLanded>,
    pub did_kill: bool,
    pub opening: Opening,
}

impl Conversion {
    /// Total damage across all landed moves.
    pub fn total_damage(&self) -> f32 {
        self.moves.iter().map(|m| m.damage).sum()
    }
}

/// Transient per-direction scanning state.
#[derive(Debug, Default)]
struct DirectionState {
    /// Index into the conversion list of the open conversion, if any.
    open: Option<usize>,
    /// Index into the open conversion's move list of the move currently
    /// accumulating hits.
    current_move: Option<usize>,
    /// Consecutive actionable frames since the opponent escaped the punish.
    reset_counter: u32,
    /// Attacker action-state id at the moment of the last registered hit.
    /// Cleared when the attacker's animation moves on; a cleared marker
    /// means the next hit starts a new move.
    last_hit_animation: Option<u16>,
}

/// Streaming conversion detector for every ordered pair of a match.
#[derive(Debug)]
pub struct ConversionComputer {
    pairs: Vec<PlayerIndexedPair>,
    state: FxHashMap<PlayerIndexedPair, DirectionState>,
    conversions: Vec<Conversion>,
    /// Latest end frame recorded per attacking slot by the deferred pass.
    /// The stored value is None when that direction's most recently
    /// classified conversion was still open.
    last_end_frame: FxHashMap<u8, Option<i32>>,
}

impl ConversionComputer {
    pub fn new(pairs: &[PlayerIndexedPair]) -> Self {
        let state = pairs.iter().map(|&pair| (pair, DirectionState::default())).collect();
        Self {
            pairs: pairs.to_vec(),
            state,
            conversions: Vec::new(),
            last_end_frame: FxHashMap::default(),
        }
    }

    /// Every conversion recorded so far, in creation order. Openings are
    /// only resolved up to the last [`Self::resolve_openings`] call.
    pub fn conversions(&self) -> &[Conversion] {
        &self.conversions
    }

    pub fn into_conversions(self) -> Vec<Conversion> {
        self.conversions
    }

    fn process_pair(&mut self, pair: PlayerIndexedPair, frame: &FrameEntry, frames: &FrameAggregator) {
        let prev = frames.previous_frame(frame.frame);
        let player_post = frame.post(pair.player);
        let prev_player_post = prev.post(pair.player);
        let opponent_post = frame.post(pair.opponent);
        let prev_opponent_post = prev.post(pair.opponent);

        let state = match self.state.get_mut(&pair) {
            Some(state) => state,
            None => return,
        };

        let opponent_damaged = opponent_post.action_state_id.map_or(false, is_damaged);
        let opponent_grabbed = opponent_post.action_state_id.map_or(false, is_grabbed);
        let delta = damage_taken(&opponent_post, &prev_opponent_post);

        // Clear the last-hit marker once the attacker's animation moved on,
        // or when the per-state counter restarted (the same move was
        // re-triggered before the id could change).
        let action_changed = player_post.action_state_id != state.last_hit_animation;
        let counter_reset = match (player_post.action_state_counter, prev_player_post.action_state_counter)
        {
            (Some(current), Some(previous)) => current < previous,
            _ => false,
        };
        if action_changed || counter_reset {
            state.last_hit_animation = None;
        }

        if opponent_damaged || opponent_grabbed {
            let open_index = match state.open {
                Some(index) => index,
                None => {
                    log::trace!(
                        "conversion opened: {} -> {} at frame {}",
                        pair.player,
                        pair.opponent,
                        frame.frame
                    );
                    self.conversions.push(Conversion {
                        player_index: pair.player,
                        opponent_index: pair.opponent,
                        start_frame: frame.frame,
                        end_frame: None,
                        start_percent: prev_opponent_post.percent_or_zero(),
                        current_percent: opponent_post.percent_or_zero(),
                        end_percent: None,
                        moves: Vec::new(),
                        did_kill: false,
                        opening: Opening::Unknown,
                    });
                    let index = self.conversions.len() - 1;
                    state.open = Some(index);
                    index
                }
            };

            if delta > 0.0 {
                let conversion = &mut self.conversions[open_index];
                if state.last_hit_animation.is_none() {
                    conversion.moves.push(MoveLanded {
                        frame: frame.frame,
                        move_id: player_post.last_attack_landed.unwrap_or(0),
                        hit_count: 0,
                        damage: 0.0,
                    });
                    state.current_move = Some(conversion.moves.len() - 1);
                }
                if let Some(move_index) = state.current_move {
                    if let Some(landed) = conversion.moves.get_mut(move_index) {
                        landed.hit_count += 1;
                        landed.damage += delta;
                    }
                }
                // The previous frame holds the animation that actually
                // connected, even when both players hit each other on the
                // same frame.
                state.last_hit_animation = prev_player_post.action_state_id;
            }
        }

        // Everything below is termination handling for an open conversion.
        let open_index = match state.open {
            Some(index) => index,
            None => return,
        };

        let opponent_in_control = opponent_post.action_state_id.map_or(false, is_in_control);
        let lost_stock = did_lose_stock(&opponent_post, &prev_opponent_post);

        if !lost_stock {
            self.conversions[open_index].current_percent = opponent_post.percent_or_zero();
        }

        if opponent_damaged || opponent_grabbed {
            state.reset_counter = 0;
        }

        // Count actionable frames: start the counter the frame the opponent
        // regains control, keep counting while it runs.
        let start_counting = state.reset_counter == 0 && opponent_in_control;
        if start_counting || state.reset_counter > 0 {
            state.reset_counter += 1;
        }

        let mut should_close = false;
        if lost_stock {
            self.conversions[open_index].did_kill = true;
            should_close = true;
        }
        if state.reset_counter >= PUNISH_RESET_FRAMES {
            should_close = true;
        }

        if should_close {
            let conversion = &mut self.conversions[open_index];
            conversion.end_frame = Some(frame.frame);
            conversion.end_percent = Some(prev_opponent_post.percent_or_zero());
            log::debug!(
                "conversion closed: {} -> {} frames {}..{} ({} moves, kill: {})",
                pair.player,
                pair.opponent,
                conversion.start_frame,
                frame.frame,
                conversion.moves.len(),
                conversion.did_kill
            );
            state.open = None;
            state.current_move = None;
        }
    }

    /// Deferred opening classification.
    ///
    /// Resolves every unknown opening old enough that a simultaneous
    /// opposite-direction opening must already be visible, in ascending
    /// start-frame order. Same-frame groups become trades; otherwise a
    /// conversion that started while the opponent's own punish was still
    /// running is a counter-attack, anything else a neutral win. Each
    /// direction's last classified end frame is recorded incrementally so a
    /// later conversion sees its earlier siblings.
    pub fn resolve_openings(&mut self, latest_processed_frame: Option<i32>) {
        let latest = match latest_processed_frame {
            Some(latest) => latest,
            None => return,
        };
        let cutoff = latest - OPENING_LOOKBACK_FRAMES;

        let mut pending: Vec<usize> = (0..self.conversions.len())
            .filter(|&i| {
                self.conversions[i].opening == Opening::Unknown
                    && self.conversions[i].start_frame < cutoff
            })
            .collect();
        pending.sort_by_key(|&i| self.conversions[i].start_frame);

        let mut index = 0;
        while index < pending.len() {
            let start_frame = self.conversions[pending[index]].start_frame;
            let mut group_end = index;
            while group_end < pending.len()
                && self.conversions[pending[group_end]].start_frame == start_frame
            {
                group_end += 1;
            }
            let is_trade = group_end - index >= 2;

            for &conversion_index in &pending[index..group_end] {
                // Record this direction's end frame before labeling so a
                // later sibling can see it. Still-open conversions record
                // None, clearing any earlier value.
                let end_frame = self.conversions[conversion_index].end_frame;
                let player = self.conversions[conversion_index].player_index;
                self.last_end_frame.insert(player, end_frame);

                let opponent = self.conversions[conversion_index].opponent_index;
                let opponent_end =
                    self.last_end_frame.get(&opponent).copied().flatten();

                let conversion = &mut self.conversions[conversion_index];
                conversion.opening = if is_trade {
                    Opening::Trade
                } else {
                    match opponent_end {
                        Some(end) if end > conversion.start_frame => Opening::CounterAttack,
                        _ => Opening::NeutralWin,
                    }
                };
            }
            index = group_end;
        }
    }
}

impl StatComputer for ConversionComputer {
    fn process_frame(&mut self, frame: &FrameEntry, frames: &FrameAggregator) {
        for i in 0..self.pairs.len() {
            let pair = self.pairs[i];
            self.process_pair(pair, frame, frames);
        }
    }
}
