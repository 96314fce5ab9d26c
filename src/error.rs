//! Error types for every fallible seam in the engine.

use thiserror::Error;

/// Domain violations raised by [`crate::strategy::Strategy`] accessors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("score {0} out of range [0, {1})")]
    ScoreOutOfRange(i32, u32),
    #[error("roll count {0} out of range [{1}, {2}]")]
    RollOutOfRange(i32, u32, u32),
}

/// Failures raised by [`crate::session::Session`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no strategy with id {0:?}")]
    UnknownStrategy(String),
    #[error("no config entry for key {0:?}")]
    UnknownConfigKey(String),
    #[error("strategy {0:?} is already owned by another session")]
    AlreadyOwned(String),
}

/// Failures decoding the strategy wire format.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("missing framing marker")]
    MissingFramingMarker,
    #[error("truncated stream: expected {expected} more bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("id or name bytes are not valid utf-8")]
    InvalidUtf8,
}
