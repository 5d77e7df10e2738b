//! Heartbeat endpoint resolution.
//!
//! The probe targets a package that never exists in the repository the host
//! already talks to, so the index sees the request without serving content.

use aau_settings::{ConfigSnapshot, HeartbeatMode};
use tracing::debug;

/// Cloud repository base, preferred when the host uses it.
pub const CLOUD_REPO: &str = "https://repo.anaconda.cloud";
/// Public package repository base.
pub const COM_REPO: &str = "https://repo.anaconda.com/pkgs";
/// Community channel host.
pub const ORG_REPO: &str = "https://conda.anaconda.org";

const PREFERENCE: [&str; 3] = [CLOUD_REPO, COM_REPO, ORG_REPO];

/// Pick the repository base from the host's channel URLs.
///
/// With no channels configured the host falls back to its default channel,
/// which lives on [`COM_REPO`].
pub fn preferred_repo(channel_urls: &[String]) -> Option<&'static str> {
    if channel_urls.is_empty() {
        return Some(COM_REPO);
    }
    PREFERENCE
        .into_iter()
        .find(|base| channel_urls.iter().any(|u| u.starts_with(base)))
}

/// Resolve the full heartbeat URL.
///
/// `channel` may be a channel name or, if it contains a `/`, a full base URL.
/// An explicit heartbeat URL in the snapshot is used as the base unless a
/// channel URL overrides it. `path` replaces the configured heartbeat path.
/// Returns `None` when no known repository is in use.
pub fn resolve_endpoint(
    snapshot: &ConfigSnapshot,
    channel: Option<&str>,
    path: Option<&str>,
) -> Option<String> {
    let channel = channel.filter(|c| !c.is_empty());
    let base = match (channel, &snapshot.heartbeat) {
        (Some(c), _) if c.contains('/') => c.to_string(),
        (_, HeartbeatMode::Url(url)) => url.clone(),
        _ => {
            let Some(repo) = preferred_repo(&snapshot.channel_urls) else {
                debug!("no known repository among channel urls, no heartbeat");
                return None;
            };
            format!("{repo}/{}", channel.unwrap_or(&snapshot.channel))
        }
    };
    let path = path.filter(|p| !p.is_empty()).unwrap_or(&snapshot.heartbeat_path);
    let url = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    debug!(url = %url, "heartbeat url");
    Some(url)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
