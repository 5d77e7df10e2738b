//! Settings error types.

use thiserror::Error;

/// Errors that can occur when loading or parsing settings.
///
/// None of these is fatal to the host: callers fall back to the safe
/// default (subsystem enabled, heartbeat disabled).
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the settings file.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A settings value was malformed or unrecognized.
    #[error("invalid settings value for {key}: {value:?}")]
    InvalidValue {
        /// Settings key the value was supplied for.
        key: &'static str,
        /// The offending raw value.
        value: String,
    },
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
