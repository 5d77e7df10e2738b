//! Heartbeat error types.
//!
//! None of these reach the host. The dispatcher logs them at debug level and
//! drops them, even under `AAU_RAISE`.

/// Errors from a single heartbeat attempt.
#[derive(Debug, thiserror::Error)]
pub enum HeartbeatError {
    /// Transport failure: DNS, refused connection, TLS.
    #[error("heartbeat request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// No response before the deadline.
    #[error("heartbeat timed out after {timeout_ms}ms")]
    Timeout {
        /// The deadline that expired.
        timeout_ms: u64,
    },

    /// The endpoint answered with a non-success status.
    #[error("heartbeat endpoint returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The resolved endpoint is not a valid URL.
    #[error("invalid heartbeat url: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// The background runtime could not be started.
    #[error("heartbeat runtime unavailable: {0}")]
    Runtime(#[from] std::io::Error),
}
