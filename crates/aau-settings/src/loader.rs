//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`AauSettings::default()`]
//! 2. If `~/.aau/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `AAU_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::snapshot::ConfigSnapshot;
use crate::types::{AauSettings, FlagValue, MAX_HEARTBEAT_TIMEOUT_MS, MIN_HEARTBEAT_TIMEOUT_MS};

/// Master switch override.
pub const ENV_ANON_USAGE: &str = "AAU_ANON_USAGE";
/// Heartbeat opt-in override.
pub const ENV_HEARTBEAT: &str = "AAU_HEARTBEAT";
/// Heartbeat timeout override, in milliseconds.
pub const ENV_HEARTBEAT_TIMEOUT_MS: &str = "AAU_HEARTBEAT_TIMEOUT_MS";

/// Resolve the path to the settings file (`~/.aau/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".aau").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<AauSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<AauSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Load the configuration snapshot for this process.
///
/// Never fails: unreadable or malformed settings fall back to defaults
/// (enabled, no heartbeat) with a diagnostic.
pub fn load_snapshot(path: &Path) -> ConfigSnapshot {
    let settings = match load_settings_from_path(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, ?path, "failed to load settings, using defaults");
            let mut defaults = AauSettings::default();
            apply_env_overrides(&mut defaults);
            defaults
        }
    };
    ConfigSnapshot::from_settings(&settings)
}

fn load_file_layer(path: &Path) -> Result<AauSettings> {
    let defaults = serde_json::to_value(AauSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut AauSettings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary lookup (testable without env vars).
///
/// Flag values are taken verbatim and parsed later by the snapshot; a
/// timeout outside 100 ms – 60 s is ignored.
pub fn apply_overrides(settings: &mut AauSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(v) = read(ENV_ANON_USAGE) {
        settings.anon_usage = Some(FlagValue::Text(v));
    }
    if let Some(v) = read(ENV_HEARTBEAT) {
        settings.heartbeat = Some(FlagValue::Text(v));
    }
    if let Some(v) = read(ENV_HEARTBEAT_TIMEOUT_MS) {
        match parse_u64_range(&v, MIN_HEARTBEAT_TIMEOUT_MS, MAX_HEARTBEAT_TIMEOUT_MS) {
            Some(ms) => settings.heartbeat_timeout_ms = ms,
            None => {
                tracing::warn!(key = ENV_HEARTBEAT_TIMEOUT_MS, value = %v, "invalid u64 env var, ignoring");
            }
        }
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;
    use crate::errors::SettingsError;
    use crate::snapshot::{HeartbeatMode, TriState};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_simple_override() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": 10});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 10);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["items"], serde_json::json!([4]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"a": null});
        assert_eq!(deep_merge(target, source)["a"], 1);
    }

    // ── file layer ──────────────────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_file_layer(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings, AauSettings::default());
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"anonUsage": "no", "channelUrls": ["https://repo.anaconda.com/pkgs/main"]}"#,
        )
        .unwrap();

        let settings = load_file_layer(&path).unwrap();
        assert_eq!(settings.anon_usage, Some(FlagValue::Text("no".into())));
        assert_eq!(settings.channel_urls.len(), 1);
        assert_eq!(settings.heartbeat_timeout_ms, 5_000);
        assert_eq!(settings.channel, "main");
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();
        assert_matches!(load_file_layer(&path), Err(SettingsError::Json(_)));
    }

    #[test]
    fn snapshot_from_invalid_file_is_safe_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{{{").unwrap();
        let snap = load_snapshot(&path);
        assert!(snap.heartbeat_timeout > Duration::ZERO);
        assert!(!snap.heartbeat_enabled());
    }

    #[test]
    fn snapshot_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"heartbeat": true, "heartbeatTimeoutMs": 1500}"#).unwrap();

        let settings = load_file_layer(&path).unwrap();
        let snap = ConfigSnapshot::from_settings(&settings);
        assert_eq!(snap.heartbeat, HeartbeatMode::Channel);
        assert_eq!(snap.heartbeat_timeout, Duration::from_millis(1500));
    }

    // ── overrides ───────────────────────────────────────────────────

    #[test]
    fn overrides_take_priority() {
        let mut settings = AauSettings {
            anon_usage: Some(FlagValue::Bool(true)),
            ..AauSettings::default()
        };
        apply_overrides(
            &mut settings,
            lookup(&[
                ("AAU_ANON_USAGE", "off"),
                ("AAU_HEARTBEAT", "https://example.com/hb"),
                ("AAU_HEARTBEAT_TIMEOUT_MS", "1000"),
            ]),
        );
        let snap = ConfigSnapshot::from_settings(&settings);
        assert_eq!(snap.anon_usage, TriState::Disabled);
        assert_eq!(snap.heartbeat, HeartbeatMode::Url("https://example.com/hb".into()));
        assert_eq!(snap.heartbeat_timeout, Duration::from_secs(1));
    }

    #[test]
    fn empty_and_out_of_range_overrides_are_ignored() {
        let mut settings = AauSettings::default();
        apply_overrides(
            &mut settings,
            lookup(&[("AAU_ANON_USAGE", ""), ("AAU_HEARTBEAT_TIMEOUT_MS", "5")]),
        );
        assert_eq!(settings, AauSettings::default());
    }

    #[test]
    fn parse_u64_bounds() {
        assert_eq!(parse_u64_range("100", 100, 60_000), Some(100));
        assert_eq!(parse_u64_range("60001", 100, 60_000), None);
        assert_eq!(parse_u64_range("abc", 100, 60_000), None);
    }
}
