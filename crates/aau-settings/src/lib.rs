//! # aau-settings
//!
//! Configuration for the anonymous usage subsystem.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** : [`AauSettings::default()`]
//! 2. **User file** : `~/.aau/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** : `AAU_*` overrides (highest priority)
//!
//! The result is frozen into a [`ConfigSnapshot`] once per process. There is
//! no global cache: the snapshot is handed to the token engine explicitly.
//!
//! # Usage
//!
//! ```no_run
//! use aau_settings::{load_snapshot, settings_path};
//!
//! let snapshot = load_snapshot(&settings_path());
//! println!("enabled: {}", snapshot.is_enabled());
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod snapshot;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_settings, load_settings_from_path,
    load_snapshot, settings_path,
};
pub use snapshot::{ConfigSnapshot, HeartbeatMode, TriState, parse_bool};
pub use types::{AauSettings, FlagValue};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = AauSettings::default();
        let _snapshot = ConfigSnapshot::default();
        let path = settings_path();
        assert!(path.ends_with(".aau/settings.json"));
    }
}
