//! User-agent suffix rendering.
//!
//! Rendering is a pure function of the snapshot and the resolved tokens:
//! `"<prefix>/<value>"` pairs in kind order, joined by single spaces.

use std::fmt;
use std::sync::LazyLock;

use aau_settings::ConfigSnapshot;
use regex::Regex;

use crate::kind::Token;
use crate::registry::TokenSet;

/// Marker that identifies a user agent carrying our tokens.
const MARKER: &str = " aau/";

static TOKEN_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" ([a-z]/)[^ ]+").unwrap());

/// The ordered, immutable token suffix for one invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserAgentSuffix {
    parts: Vec<Token>,
}

impl UserAgentSuffix {
    /// Tokens in rendering order.
    pub fn tokens(&self) -> &[Token] {
        &self.parts
    }

    /// Whether the suffix renders to the empty string.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// `(prefix, value)` pairs in rendering order.
    pub fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.parts.iter().map(|t| (t.kind.prefix(), t.value.as_str()))
    }
}

impl fmt::Display for UserAgentSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (prefix, value)) in self.pairs().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{prefix}/{value}")?;
        }
        Ok(())
    }
}

/// Order the present tokens for rendering.
pub fn build_suffix(tokens: &TokenSet) -> UserAgentSuffix {
    UserAgentSuffix {
        parts: tokens.iter().cloned().collect(),
    }
}

/// Render the suffix, or the empty string when the subsystem is disabled.
pub fn compose(snapshot: &ConfigSnapshot, tokens: &TokenSet) -> String {
    if !snapshot.is_enabled() {
        return String::new();
    }
    build_suffix(tokens).to_string()
}

/// Append `suffix` to the host's user agent with one separating space.
pub fn append_to_user_agent(host: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        host.to_string()
    } else if host.is_empty() {
        suffix.to_string()
    } else {
        format!("{host} {suffix}")
    }
}

/// Hide token values in a user agent meant for display.
///
/// Strings without the `aau/` marker are returned unchanged.
pub fn redact(user_agent: &str) -> String {
    if !user_agent.contains(MARKER) {
        return user_agent.to_string();
    }
    TOKEN_VALUE.replace_all(user_agent, " ${1}.").into_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
