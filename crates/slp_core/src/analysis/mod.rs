//! # Stat Engines
//!
//! Per-pair stat engines driven once per completed frame by the pipeline.
//!
//! - `conversions` - punish sequence detection and opening classification
//! - `inputs` - controller input activity tallies

pub mod conversions;
pub mod inputs;

pub use conversions::{
    Conversion, ConversionComputer, MoveLanded, Opening, OPENING_LOOKBACK_FRAMES,
    PUNISH_RESET_FRAMES,
};
pub use inputs::{InputComputer, PlayerInputs, StickRegion};
