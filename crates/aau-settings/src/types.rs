//! Raw settings as they appear in the settings file.
//!
//! Field names are camelCase on the wire. Every field has a default so a
//! partial (or empty) file deserializes cleanly. Flag values are kept loosely
//! typed here; [`crate::snapshot`] turns them into strict enumerations.

use serde::{Deserialize, Serialize};

/// Default heartbeat timeout in milliseconds.
pub const DEFAULT_HEARTBEAT_TIMEOUT_MS: u64 = 5_000;

/// Shortest accepted heartbeat timeout in milliseconds.
pub const MIN_HEARTBEAT_TIMEOUT_MS: u64 = 100;

/// Longest accepted heartbeat timeout in milliseconds.
pub const MAX_HEARTBEAT_TIMEOUT_MS: u64 = 60_000;

/// Default path appended to the heartbeat channel URL.
pub const DEFAULT_HEARTBEAT_PATH: &str = "/noarch/activate-0.0.0-0.conda";

/// Default channel name used when resolving the heartbeat endpoint.
pub const DEFAULT_CHANNEL: &str = "main";

/// A configuration flag as written by the user: a JSON boolean or a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    /// `true` / `false`.
    Bool(bool),
    /// Any string spelling (`"yes"`, `"off"`, a URL, ...).
    Text(String),
}

/// Root settings type.
///
/// Loaded from `~/.aau/settings.json` with defaults applied for missing
/// fields. Environment variables can override specific values.
///
/// # JSON Format
///
/// ```json
/// {
///   "anonUsage": "false #!final",
///   "heartbeat": true,
///   "channelUrls": ["https://repo.anaconda.com/pkgs/main"]
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AauSettings {
    /// Tri-state master switch; absent means enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anon_usage: Option<FlagValue>,
    /// Heartbeat opt-in: a boolean or a full URL; absent means disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<FlagValue>,
    /// Heartbeat probe timeout in milliseconds.
    pub heartbeat_timeout_ms: u64,
    /// Path appended to the resolved channel URL for the probe.
    pub heartbeat_path: String,
    /// Channel name joined to the repository base URL.
    pub channel: String,
    /// Channel URLs known to the host, used to pick the heartbeat repository.
    pub channel_urls: Vec<String>,
}

impl Default for AauSettings {
    fn default() -> Self {
        Self {
            anon_usage: None,
            heartbeat: None,
            heartbeat_timeout_ms: DEFAULT_HEARTBEAT_TIMEOUT_MS,
            heartbeat_path: DEFAULT_HEARTBEAT_PATH.to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            channel_urls: Vec::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
