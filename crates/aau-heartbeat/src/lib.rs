//! # aau-heartbeat
//!
//! Best-effort activation heartbeat. A single `HEAD` request carrying the
//! anonymous usage suffix is sent on its own thread with a short deadline.
//! Delivery is never guaranteed and failures are never surfaced.
//!
//! ## Crate Position
//!
//! Depends on aau-core and aau-settings. Depended on by aau-cli.

#![deny(unsafe_code)]

pub mod dispatcher;
pub mod endpoint;
pub mod errors;

use aau_settings::ConfigSnapshot;

pub use dispatcher::{DEFAULT_TIMEOUT, HeartbeatDispatcher, HeartbeatHandle, probe};
pub use endpoint::{preferred_repo, resolve_endpoint};
pub use errors::HeartbeatError;

/// Send the activation heartbeat if the snapshot opts in.
///
/// Returns `None` when the heartbeat is off or no endpoint resolves.
pub fn on_activate(
    snapshot: &ConfigSnapshot,
    dispatcher: &HeartbeatDispatcher,
    user_agent: &str,
) -> Option<HeartbeatHandle> {
    if !snapshot.heartbeat_enabled() {
        return None;
    }
    let url = resolve_endpoint(snapshot, None, None)?;
    Some(dispatcher.fire(&url, user_agent))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
