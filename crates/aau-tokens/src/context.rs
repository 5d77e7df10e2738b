//! Per-process anonymous usage context.
//!
//! Built once at startup from the configuration snapshot and the registry,
//! then shared read-only with whatever needs the suffix. Nothing here is
//! global: hosts hold the context and pass it where it is needed.

use aau_settings::ConfigSnapshot;
use tracing::debug;

use crate::composer::{UserAgentSuffix, append_to_user_agent, build_suffix};
use crate::errors::TokenError;
use crate::registry::{TokenRegistry, TokenSet};

/// The snapshot and resolved tokens for this process.
#[derive(Debug)]
pub struct AnonUsageContext {
    snapshot: ConfigSnapshot,
    tokens: TokenSet,
    suffix: UserAgentSuffix,
    rendered: String,
    registry: TokenRegistry,
}

impl AnonUsageContext {
    /// Resolve tokens (unless disabled) and render the suffix.
    ///
    /// When the subsystem is disabled no cache file is read or written.
    pub fn initialize(snapshot: ConfigSnapshot, registry: TokenRegistry) -> Result<Self, TokenError> {
        let tokens = if snapshot.is_enabled() {
            registry.resolve()?
        } else {
            debug!("anonymous usage disabled, no tokens resolved");
            TokenSet::default()
        };
        let suffix = build_suffix(&tokens);
        let rendered = suffix.to_string();
        debug!(suffix = %rendered, "user agent suffix");
        Ok(Self {
            snapshot,
            tokens,
            suffix,
            rendered,
            registry,
        })
    }

    /// The configuration this context was built from.
    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// Resolved tokens; empty when disabled.
    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    /// The structured suffix.
    pub fn suffix(&self) -> &UserAgentSuffix {
        &self.suffix
    }

    /// The rendered suffix; empty when disabled.
    pub fn suffix_str(&self) -> &str {
        &self.rendered
    }

    /// The host's user agent with the suffix appended.
    pub fn user_agent(&self, host: &str) -> String {
        append_to_user_agent(host, &self.rendered)
    }

    /// Write deferred cache entries whose directories now exist.
    pub fn flush(&self) -> usize {
        self.registry.flush()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aau_core::DebugFlags;
    use aau_settings::TriState;
    use tempfile::TempDir;

    use super::*;
    use crate::generator::TokenGenerator;
    use crate::identity::NoIdentity;
    use crate::registry::{RegistryConfig, client_token_path};

    fn registry(home: &TempDir) -> TokenRegistry {
        TokenRegistry::new(
            RegistryConfig::new(home.path()),
            TokenGenerator::default(),
            Arc::new(NoIdentity),
            DebugFlags::default(),
        )
    }

    #[test]
    fn enabled_context_renders_suffix() {
        let home = TempDir::new().unwrap();
        let ctx = AnonUsageContext::initialize(ConfigSnapshot::default(), registry(&home)).unwrap();
        assert!(ctx.suffix_str().starts_with("aau/"));
        assert!(ctx.suffix_str().contains(" c/"));
        assert!(ctx.suffix_str().contains(" s/"));
        assert_eq!(
            ctx.user_agent("conda/24.1"),
            format!("conda/24.1 {}", ctx.suffix_str())
        );
    }

    #[test]
    fn disabled_context_touches_nothing() {
        let home = TempDir::new().unwrap();
        let snapshot = ConfigSnapshot {
            anon_usage: TriState::Disabled,
            ..ConfigSnapshot::default()
        };
        let ctx = AnonUsageContext::initialize(snapshot, registry(&home)).unwrap();
        assert_eq!(ctx.suffix_str(), "");
        assert!(ctx.tokens().is_empty());
        assert_eq!(ctx.user_agent("conda/24.1"), "conda/24.1");
        assert!(!client_token_path(home.path()).exists());
    }

    #[test]
    fn session_is_fixed_for_the_context() {
        let home = TempDir::new().unwrap();
        let ctx = AnonUsageContext::initialize(ConfigSnapshot::default(), registry(&home)).unwrap();
        assert_eq!(ctx.user_agent("x"), ctx.user_agent("x"));
    }
}
