//! The immutable configuration snapshot consumed by the token engine.
//!
//! Loosely typed flag values are parsed with strict enumerations. Anything
//! unrecognized falls back to the safe value with a diagnostic: the master
//! switch to [`TriState::Unset`] (enabled), the heartbeat to
//! [`HeartbeatMode::Off`].

use std::time::Duration;

use url::Url;

use crate::errors::{Result, SettingsError};
use crate::types::{
    AauSettings, DEFAULT_HEARTBEAT_TIMEOUT_MS, FlagValue, MAX_HEARTBEAT_TIMEOUT_MS,
    MIN_HEARTBEAT_TIMEOUT_MS,
};

/// Annotation marking a value as not user-overridable.
pub const LOCK_ANNOTATION: &str = "#!final";

/// Tri-state master switch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriState {
    /// Explicitly enabled.
    Enabled,
    /// Explicitly disabled.
    Disabled,
    /// Not configured; resolves to enabled.
    #[default]
    Unset,
}

impl TriState {
    /// Resolve the tri-state to a plain boolean (`Unset` is enabled).
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Heartbeat opt-in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum HeartbeatMode {
    /// No heartbeat.
    #[default]
    Off,
    /// Heartbeat to the repository resolved from the host's channels.
    Channel,
    /// Heartbeat to an explicit URL.
    Url(String),
}

/// A resolved, read-only view of the configuration.
///
/// Built once per process and never re-read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// Master switch.
    pub anon_usage: TriState,
    /// Whether the master switch carried the lock annotation. Informational.
    pub locked: bool,
    /// Heartbeat opt-in.
    pub heartbeat: HeartbeatMode,
    /// Heartbeat probe timeout.
    pub heartbeat_timeout: Duration,
    /// Path appended to the resolved channel URL.
    pub heartbeat_path: String,
    /// Channel name joined to the repository base URL.
    pub channel: String,
    /// Channel URLs known to the host.
    pub channel_urls: Vec<String>,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self::from_settings(&AauSettings::default())
    }
}

impl ConfigSnapshot {
    /// Freeze raw settings into a snapshot, degrading bad values to safe defaults.
    pub fn from_settings(settings: &AauSettings) -> Self {
        let (anon_usage, locked) = match settings.anon_usage.as_ref().map(parse_tri_state) {
            None => (TriState::Unset, false),
            Some(Ok(parsed)) => parsed,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "unrecognized anonUsage value, treating as enabled");
                (TriState::Unset, false)
            }
        };
        let heartbeat = match settings.heartbeat.as_ref().map(parse_heartbeat) {
            None => HeartbeatMode::Off,
            Some(Ok(mode)) => mode,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "invalid heartbeat value, heartbeat disabled");
                HeartbeatMode::Off
            }
        };
        Self {
            anon_usage,
            locked,
            heartbeat,
            heartbeat_timeout: heartbeat_timeout(settings.heartbeat_timeout_ms),
            heartbeat_path: settings.heartbeat_path.clone(),
            channel: settings.channel.clone(),
            channel_urls: settings.channel_urls.clone(),
        }
    }

    /// Whether the token subsystem is enabled.
    pub fn is_enabled(&self) -> bool {
        self.anon_usage.is_enabled()
    }

    /// Whether a heartbeat should be attempted at activation.
    pub fn heartbeat_enabled(&self) -> bool {
        !matches!(self.heartbeat, HeartbeatMode::Off)
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on`/`enable`/`enabled` or
/// `false`/`0`/`no`/`off`/`disable`/`disabled`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enable" | "enabled" => Some(true),
        "false" | "0" | "no" | "off" | "disable" | "disabled" => Some(false),
        _ => None,
    }
}

/// Split a trailing lock annotation off a raw value.
fn strip_lock(raw: &str) -> (&str, bool) {
    let raw = raw.trim();
    match raw.strip_suffix(LOCK_ANNOTATION) {
        Some(rest) => (rest.trim_end(), true),
        None => (raw, false),
    }
}

/// Parse the master switch into `(state, locked)`.
///
/// An empty string is `Unset`. Unrecognized spellings are an error; the
/// snapshot builder maps that error to `Unset`.
pub fn parse_tri_state(value: &FlagValue) -> Result<(TriState, bool)> {
    match value {
        FlagValue::Bool(true) => Ok((TriState::Enabled, false)),
        FlagValue::Bool(false) => Ok((TriState::Disabled, false)),
        FlagValue::Text(raw) => {
            let (text, locked) = strip_lock(raw);
            if text.is_empty() {
                return Ok((TriState::Unset, locked));
            }
            match parse_bool(text) {
                Some(true) => Ok((TriState::Enabled, locked)),
                Some(false) => Ok((TriState::Disabled, locked)),
                None => Err(SettingsError::InvalidValue {
                    key: "anonUsage",
                    value: raw.clone(),
                }),
            }
        }
    }
}

/// Parse the heartbeat opt-in: a boolean spelling or a full URL.
pub fn parse_heartbeat(value: &FlagValue) -> Result<HeartbeatMode> {
    match value {
        FlagValue::Bool(true) => Ok(HeartbeatMode::Channel),
        FlagValue::Bool(false) => Ok(HeartbeatMode::Off),
        FlagValue::Text(raw) => {
            let (text, _) = strip_lock(raw);
            if text.is_empty() {
                return Ok(HeartbeatMode::Off);
            }
            match parse_bool(text) {
                Some(true) => Ok(HeartbeatMode::Channel),
                Some(false) => Ok(HeartbeatMode::Off),
                None if is_full_url(text) => Ok(HeartbeatMode::Url(text.to_string())),
                None => Err(SettingsError::InvalidValue {
                    key: "heartbeat",
                    value: raw.clone(),
                }),
            }
        }
    }
}

/// A full URL parses on its own and names a host.
fn is_full_url(text: &str) -> bool {
    match Url::parse(text) {
        Ok(url) => url.has_host(),
        Err(e) => {
            tracing::debug!(value = %text, error = %e, "heartbeat value is not a URL");
            false
        }
    }
}

/// The configured probe timeout, or the default when it falls outside
/// 100 ms to 60 s.
fn heartbeat_timeout(ms: u64) -> Duration {
    if (MIN_HEARTBEAT_TIMEOUT_MS..=MAX_HEARTBEAT_TIMEOUT_MS).contains(&ms) {
        return Duration::from_millis(ms);
    }
    tracing::warn!(
        value = ms,
        default = DEFAULT_HEARTBEAT_TIMEOUT_MS,
        "heartbeatTimeoutMs out of range, using default"
    );
    Duration::from_millis(DEFAULT_HEARTBEAT_TIMEOUT_MS)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
