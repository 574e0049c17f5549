//! Typed frame records assembled from the decoder's update stream.

use serde::{Deserialize, Serialize};

/// Number of controller ports a match can occupy.
pub const MAX_SLOTS: usize = 4;

/// Controller state sampled before the engine simulated a frame.
///
/// Every field is optional: older recordings omit some of them, and the
/// defaulted record doubles as the "no prior data" placeholder so deltas
/// computed against it degrade to zero instead of failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PreFrame {
    /// Main stick deflection, unit coordinates in [-1, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joystick_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joystick_y: Option<f32>,
    /// C-stick deflection, unit coordinates in [-1, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cstick_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cstick_y: Option<f32>,
    /// Analog trigger depth in [0, 1], per side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_l: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_r: Option<f32>,
    /// Physical button bitmask as reported by the controller poll.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<u16>,
}

impl PreFrame {
    /// Main stick coordinates, absent axes reading as centered.
    pub fn joystick(&self) -> (f32, f32) {
        (self.joystick_x.unwrap_or(0.0), self.joystick_y.unwrap_or(0.0))
    }

    /// C-stick coordinates, absent axes reading as centered.
    pub fn cstick(&self) -> (f32, f32) {
        (self.cstick_x.unwrap_or(0.0), self.cstick_y.unwrap_or(0.0))
    }

    pub fn left_trigger(&self) -> f32 {
        self.trigger_l.unwrap_or(0.0)
    }

    pub fn right_trigger(&self) -> f32 {
        self.trigger_r.unwrap_or(0.0)
    }

    /// Button bitmask, absent reading as nothing held.
    pub fn physical_buttons(&self) -> u16 {
        self.buttons.unwrap_or(0)
    }
}

/// Simulation results recorded after the engine ran a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PostFrame {
    /// Accumulated damage percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f32>,
    /// Current animation/behavior state id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_state_id: Option<u16>,
    /// Frames elapsed within the current action state. Fractional for some
    /// states; restarts when the same state is re-triggered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_state_counter: Option<f32>,
    /// Attack id of the most recent hit this player landed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attack_landed: Option<u16>,
    /// Internal character id, which tracks in-game transformations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_character_id: Option<u8>,
    /// Stocks remaining.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stocks: Option<u8>,
}

impl PostFrame {
    pub fn percent_or_zero(&self) -> f32 {
        self.percent.unwrap_or(0.0)
    }
}

/// Pre/post sub-records for one player slot on one frame. Either side may be
/// missing while the frame is still being assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerFrames {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre: Option<PreFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostFrame>,
}

/// One frame-indexed record: sub-records per player slot.
///
/// `FrameEntry::default()` is the lookback placeholder for frames that were
/// never written; all payload fields are absent so callers read "no change".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameEntry {
    /// Frame index. Negative during the pre-match countdown.
    pub frame: i32,
    pub players: [PlayerFrames; MAX_SLOTS],
}

impl FrameEntry {
    /// The pre sub-record for `slot`, if it has arrived.
    pub fn pre_record(&self, slot: u8) -> Option<PreFrame> {
        self.players.get(usize::from(slot)).and_then(|p| p.pre)
    }

    /// The post sub-record for `slot`, if it has arrived.
    pub fn post_record(&self, slot: u8) -> Option<PostFrame> {
        self.players.get(usize::from(slot)).and_then(|p| p.post)
    }

    /// The pre sub-record for `slot`, defaulted when absent.
    pub fn pre(&self, slot: u8) -> PreFrame {
        self.pre_record(slot).unwrap_or_default()
    }

    /// The post sub-record for `slot`, defaulted when absent.
    pub fn post(&self, slot: u8) -> PostFrame {
        self.post_record(slot).unwrap_or_default()
    }

    /// Whether both sub-records have arrived for `slot`.
    pub fn has_both(&self, slot: u8) -> bool {
        self.players
            .get(usize::from(slot))
            .map_or(false, |p| p.pre.is_some() && p.post.is_some())
    }
}

/// One decoded update record from the external stream decoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameUpdate {
    /// Frame index the payload belongs to. Records without one are dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<i32>,
    /// Player port slot (0-3).
    pub slot: u8,
    /// Whether the payload belongs to the slot's follower entity.
    pub is_follower: bool,
    pub payload: UpdatePayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePayload {
    Pre(PreFrame),
    Post(PostFrame),
}

impl FrameUpdate {
    pub fn pre(frame: i32, slot: u8, payload: PreFrame) -> Self {
        Self { frame: Some(frame), slot, is_follower: false, payload: UpdatePayload::Pre(payload) }
    }

    pub fn post(frame: i32, slot: u8, payload: PostFrame) -> Self {
        Self { frame: Some(frame), slot, is_follower: false, payload: UpdatePayload::Post(payload) }
    }
}
