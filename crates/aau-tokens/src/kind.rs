//! Token kinds and the token value type.

use std::fmt;

use aau_core::constants::{is_generated_token, is_system_token};

/// The kinds of token that can appear in the user-agent suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Version of this engine.
    Version,
    /// Per-installation identifier, persisted in the user's home.
    Client,
    /// Per-process identifier, never persisted.
    Session,
    /// Per-environment identifier, persisted inside the environment prefix.
    Environment,
    /// Administrator-provisioned organization identifier.
    Organization,
    /// Administrator-provisioned machine identifier.
    Machine,
    /// Identifier derived from a signed-in cloud identity.
    Cloud,
}

impl TokenKind {
    /// All kinds, in rendering order.
    pub const ORDER: [Self; 7] = [
        Self::Version,
        Self::Client,
        Self::Session,
        Self::Environment,
        Self::Organization,
        Self::Machine,
        Self::Cloud,
    ];

    /// Prefix used when rendering the token into the user agent.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Version => "aau",
            Self::Client => "c",
            Self::Session => "s",
            Self::Environment => "e",
            Self::Organization => "o",
            Self::Machine => "m",
            Self::Cloud => "a",
        }
    }

    /// Single letter used by the chaos switches.
    pub fn letter(self) -> char {
        match self {
            Self::Version => 'v',
            Self::Client => 'c',
            Self::Session => 's',
            Self::Environment => 'e',
            Self::Organization => 'o',
            Self::Machine => 'm',
            Self::Cloud => 'a',
        }
    }

    /// Whether `value` has the expected format for this kind.
    pub fn is_valid(self, value: &str) -> bool {
        match self {
            Self::Client | Self::Session | Self::Environment => is_generated_token(value),
            Self::Organization | Self::Machine => is_system_token(value),
            Self::Version | Self::Cloud => !value.is_empty() && !value.contains(char::is_whitespace),
        }
    }

    /// Human-readable name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Client => "client",
            Self::Session => "session",
            Self::Environment => "environment",
            Self::Organization => "organization",
            Self::Machine => "machine",
            Self::Cloud => "cloud",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// What the token identifies.
    pub kind: TokenKind,
    /// The opaque value.
    pub value: String,
    /// Whether the value is backed by a cache file on disk.
    pub persisted: bool,
}

impl Token {
    /// A token that lives only for this process.
    pub fn ephemeral(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            persisted: false,
        }
    }

    /// A token backed by a cache file.
    pub fn persisted(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            persisted: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_in_order() {
        let prefixes: Vec<_> = TokenKind::ORDER.iter().map(|k| k.prefix()).collect();
        assert_eq!(prefixes, ["aau", "c", "s", "e", "o", "m", "a"]);
    }

    #[test]
    fn validation_per_kind() {
        assert!(TokenKind::Client.is_valid("abcdefghijklmnopqrstuv"));
        assert!(!TokenKind::Client.is_valid("short"));
        assert!(TokenKind::Organization.is_valid("short"));
        assert!(!TokenKind::Organization.is_valid("bad token"));
        assert!(TokenKind::Version.is_valid("0.1.0"));
        assert!(!TokenKind::Cloud.is_valid(""));
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(TokenKind::Environment.to_string(), "environment");
    }
}
