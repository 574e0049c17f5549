//! # Stats Pipeline
//!
//! Drives frame-ordered iteration over aggregated frames and fans each
//! completed frame out to the per-pair stat engines. One pipeline instance
//! covers exactly one match; constructing a fresh instance is what resets
//! all per-pair engine state at a match boundary.

use serde::{Deserialize, Serialize};

use crate::analysis::conversions::{Conversion, ConversionComputer};
use crate::analysis::inputs::{InputComputer, PlayerInputs};
use crate::error::{Result, StatsError};
use crate::frames::FrameAggregator;
use crate::models::action_state::FIRST_FRAME;
use crate::models::frame::{FrameEntry, FrameUpdate};
use crate::models::settings::{GameEnd, MatchSettings, PlayerIndexedPair};

/// A per-frame stat engine driven by the pipeline.
pub trait StatComputer {
    /// Called exactly once per completed frame, in ascending frame order.
    fn process_frame(&mut self, frame: &FrameEntry, frames: &FrameAggregator);
}

/// Aggregate outputs handed to the reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub conversions: Vec<Conversion>,
    pub inputs: Vec<PlayerInputs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_end: Option<GameEnd>,
}

/// Single-pass, push-based coordinator for one match.
///
/// Updates may arrive interleaved across slots and sub-types; the pipeline
/// only advances over a frame once every effective slot has both of its
/// sub-records, so each engine sees each frame exactly once and strictly in
/// order.
#[derive(Debug)]
pub struct StatsPipeline {
    settings: MatchSettings,
    pairs: Vec<PlayerIndexedPair>,
    slots: Vec<u8>,
    aggregator: FrameAggregator,
    conversions: ConversionComputer,
    inputs: InputComputer,
    last_processed: Option<i32>,
    game_end: Option<GameEnd>,
}

impl StatsPipeline {
    /// Validates the match metadata and sets up per-pair engine state.
    pub fn new(settings: MatchSettings) -> Result<Self> {
        let pairs = settings.singles_pairs();
        if pairs.is_empty() {
            return Err(StatsError::UnsupportedMatch { found: settings.players.len() });
        }
        let slots: Vec<u8> = settings.players.iter().map(|p| p.slot).collect();
        log::info!("stats pipeline ready for slots {:?}", slots);
        Ok(Self {
            conversions: ConversionComputer::new(&pairs),
            inputs: InputComputer::new(&pairs),
            aggregator: FrameAggregator::new(),
            settings,
            pairs,
            slots,
            last_processed: None,
            game_end: None,
        })
    }

    /// Feed one decoded update record and advance over any newly completed
    /// frames.
    pub fn ingest(&mut self, update: &FrameUpdate) {
        self.aggregator.ingest(update, &mut self.settings);
        self.process_ready_frames();
    }

    /// Store the end-of-game record. Informational only.
    pub fn handle_game_end(&mut self, end: GameEnd) {
        log::debug!("game end received (method {})", end.end_method);
        self.game_end = Some(end);
    }

    /// Match metadata, including any disguise remap applied so far.
    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// The ordered pairs this match is tracked under.
    pub fn pairs(&self) -> &[PlayerIndexedPair] {
        &self.pairs
    }

    /// The frame store, for callers that need direct lookback.
    pub fn frames(&self) -> &FrameAggregator {
        &self.aggregator
    }

    /// Latest frame the engines have consumed.
    pub fn last_processed_frame(&self) -> Option<i32> {
        self.last_processed
    }

    /// Current aggregate snapshot. Resolves every opening that is safely
    /// classifiable; anything fresher stays unknown until more frames
    /// arrive.
    pub fn stats(&mut self) -> MatchStats {
        self.conversions.resolve_openings(self.last_processed);
        MatchStats {
            conversions: self.conversions.conversions().to_vec(),
            inputs: self.inputs.tallies(),
            game_end: self.game_end,
        }
    }

    /// Advance over every frame whose sub-records are all present, strictly
    /// in ascending order. A frame missing any sub-record blocks processing
    /// until the rest of it arrives.
    fn process_ready_frames(&mut self) {
        let latest = match self.aggregator.latest_frame() {
            Some(latest) => latest,
            None => return,
        };
        let mut next = self.last_processed.map_or(FIRST_FRAME, |frame| frame + 1);
        while next <= latest && self.aggregator.is_complete(next, &self.slots) {
            let frame = match self.aggregator.get(next) {
                Some(frame) => *frame,
                None => break,
            };
            self.conversions.process_frame(&frame, &self.aggregator);
            self.inputs.process_frame(&frame, &self.aggregator);
            self.last_processed = Some(next);
            next += 1;
        }
    }
}
