//! # Frame Aggregation
//!
//! Merges the decoder's per-player pre/post update records into complete,
//! frame-indexed entries and answers one-frame lookback queries.

use fxhash::FxHashMap;

use crate::models::action_state::{FIRST_FRAME, FIRST_PLAYABLE_FRAME};
use crate::models::frame::{FrameEntry, FrameUpdate, UpdatePayload, MAX_SLOTS};
use crate::models::settings::MatchSettings;

/// Single-writer store of every frame seen so far in one match.
///
/// Entries are created on first touch and never deleted: the conversion
/// engine needs one-frame lookback while streaming and the full history for
/// its deferred classification pass. Follower-entity records are kept in a
/// separate store and never feed the stats engines.
#[derive(Debug, Default)]
pub struct FrameAggregator {
    frames: FxHashMap<i32, FrameEntry>,
    follower_frames: FxHashMap<i32, FrameEntry>,
    latest_frame: Option<i32>,
}

impl FrameAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one decoded update record.
    ///
    /// Records without a frame number or with an out-of-range slot are
    /// dropped; the stream may end mid-frame and must not halt processing.
    /// Post records at or before the first recorded frame feed the disguise
    /// remap on `settings`.
    pub fn ingest(&mut self, update: &FrameUpdate, settings: &mut MatchSettings) {
        let frame = match update.frame {
            Some(frame) => frame,
            None => {
                log::debug!("dropping update without frame number (slot {})", update.slot);
                return;
            }
        };
        if usize::from(update.slot) >= MAX_SLOTS {
            log::debug!("dropping update for out-of-range slot {}", update.slot);
            return;
        }

        if let UpdatePayload::Post(post) = update.payload {
            if frame <= FIRST_FRAME {
                if let Some(internal) = post.internal_character_id {
                    settings.apply_disguise_remap(update.slot, internal);
                }
            }
        }

        self.latest_frame = Some(self.latest_frame.map_or(frame, |latest| latest.max(frame)));

        let store = if update.is_follower { &mut self.follower_frames } else { &mut self.frames };
        let entry = store.entry(frame).or_default();
        entry.frame = frame;
        let player = &mut entry.players[usize::from(update.slot)];
        match update.payload {
            UpdatePayload::Pre(pre) => player.pre = Some(pre),
            UpdatePayload::Post(post) => player.post = Some(post),
        }
    }

    /// The record at `frame`, if one was ever written.
    pub fn get(&self, frame: i32) -> Option<&FrameEntry> {
        self.frames.get(&frame)
    }

    /// The record at `frame`, or a zero-valued placeholder when absent.
    pub fn frame(&self, frame: i32) -> FrameEntry {
        self.frames
            .get(&frame)
            .copied()
            .unwrap_or(FrameEntry { frame, ..FrameEntry::default() })
    }

    /// The record one frame before `frame`, or a placeholder. Lookback past
    /// the start of history reads as "no prior data".
    pub fn previous_frame(&self, frame: i32) -> FrameEntry {
        self.frame(frame - 1)
    }

    /// The follower-entity record at `frame`, if any arrived.
    pub fn follower_frame(&self, frame: i32) -> Option<&FrameEntry> {
        self.follower_frames.get(&frame)
    }

    /// Highest frame index seen so far across both stores.
    pub fn latest_frame(&self) -> Option<i32> {
        self.latest_frame
    }

    /// Frames at or past the first playable frame; 0 if gameplay never
    /// started.
    pub fn playable_frame_count(&self) -> i32 {
        match self.latest_frame {
            Some(latest) if latest >= FIRST_PLAYABLE_FRAME => latest - FIRST_PLAYABLE_FRAME,
            _ => 0,
        }
    }

    /// Whether both sub-records exist on `frame` for every listed slot.
    pub fn is_complete(&self, frame: i32, slots: &[u8]) -> bool {
        self.frames
            .get(&frame)
            .map_or(false, |entry| slots.iter().all(|&slot| entry.has_both(slot)))
    }
}
