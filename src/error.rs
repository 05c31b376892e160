use thiserror::Error;

use crate::session::SessionState;

/// Errors raised at the frame boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// The provider handed over a frame with the wrong number of slots.
    #[error("malformed frame: expected {expected} landmark slots, got {actual}")]
    Malformed { expected: usize, actual: usize },

    /// The provider payload could not be decoded at all.
    #[error("frame decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
