use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// The match metadata does not reduce to a two-entity singles match.
    #[error("unsupported match: expected 2 effective players, found {found}")]
    UnsupportedMatch { found: usize },
}

pub type Result<T> = std::result::Result<T, StatsError>;
