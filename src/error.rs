//! Engine-wide error handling
//!
//! Every subsystem reports failures through [`EngineError`] so that callers
//! can treat "sampling unavailable" uniformly, whatever the underlying cause.

use thiserror::Error;

/// Type alias for engine operation results
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors produced by the sampling, loading, and compute subsystems.
///
/// Variants are owned strings rather than wrapped foreign errors because
/// terminal errors cross the compute channel boundary and must be `Send`
/// and cloneable on their own.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Network fetch of a mesh asset failed or returned a non-success status
    #[error("transport error fetching {url}: {detail}")]
    Transport { url: String, detail: String },

    /// Mesh header or body is missing, malformed, or truncated
    #[error("invalid mesh data: {0}")]
    Parse(String),

    /// The compute channel was torn down before this request got a terminal
    /// response
    #[error("compute channel closed")]
    ChannelClosed,

    /// A compute task panicked while processing a request
    #[error("compute worker panicked: {0}")]
    WorkerPanic(String),
}

impl EngineError {
    /// Build a transport error for a URL from any displayable cause
    pub fn transport(url: &str, detail: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.to_string(),
            detail: detail.to_string(),
        }
    }
}
