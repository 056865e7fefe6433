//! Error types shared by the analysis core.

use thiserror::Error;

/// Errors raised by the analysis core.
#[derive(Debug, Error)]
pub enum TunerError {
    /// A note index fell outside `[0, n_notes)`.
    #[error("note index {note} is outside the supported range 0..{n_notes}")]
    NoteOutOfRange { note: i64, n_notes: usize },

    /// The frequency transform could not run for this frame.
    #[error("transform failed: {0}")]
    TransformFailure(String),

    /// A previous transform failure stopped the engine.
    #[error("spectrum engine halted after a transform failure")]
    Halted,

    /// The startup configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config file error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("config format error: {0}")]
    ConfigFormat(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TunerError>;
