//! # slp_core - Replay Conversion & Input Stats Engine
//!
//! Consumes a strictly frame-ordered stream of decoded per-player update
//! records from a recorded match and derives two aggregate artifacts:
//!
//! - conversions: continuous punish sequences one player lands on the
//!   other, each tagged with how it began (neutral win, counter-attack, or
//!   trade)
//! - per-player controller input tallies (buttons, stick regions, triggers,
//!   joystick travel)
//!
//! Decoding the container format, file loading, and report formatting live
//! outside this crate; it consumes already-parsed update payloads through
//! [`StatsPipeline::ingest`] and hands plain aggregate structures back
//! through [`StatsPipeline::stats`].
//!
//! Processing is single-threaded and single-pass: frames are assembled by
//! the aggregator, fanned out to the stat engines once complete, and opening
//! classification runs as a deferred batch pass because it depends on frames
//! that arrive after the opening itself.

pub mod analysis;
pub mod error;
pub mod frames;
pub mod models;
pub mod pipeline;

pub use analysis::conversions::{Conversion, ConversionComputer, MoveLanded, Opening};
pub use analysis::inputs::{InputComputer, PlayerInputs, StickRegion};
pub use error::{Result, StatsError};
pub use frames::FrameAggregator;
pub use models::action_state::{FIRST_FRAME, FIRST_PLAYABLE_FRAME};
pub use models::frame::{FrameEntry, FrameUpdate, PlayerFrames, PostFrame, PreFrame, UpdatePayload};
pub use models::settings::{GameEnd, MatchSettings, PlayerIndexedPair, PlayerMeta, PlayerType};
pub use pipeline::{MatchStats, StatComputer, StatsPipeline};

/// Crate version, for embedding in exported reports.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
