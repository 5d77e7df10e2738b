//! Token error types.

use std::path::PathBuf;

use crate::kind::TokenKind;

/// Errors that can occur while producing or persisting tokens.
///
/// In normal operation these never reach the host: persistence failures
/// degrade to an ephemeral token and generation failures omit the kind.
/// They propagate only when `AAU_RAISE` is set.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// A cache file could not be read or written.
    #[error("cache file {}: {source}", path.display())]
    Persistence {
        /// Cache file path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The entropy source could not provide random bytes.
    #[error("entropy source unavailable: {0}")]
    Generation(String),

    /// Only organization and machine tokens are installed by administrators.
    #[error("{0} tokens cannot be provisioned")]
    NotProvisionable(TokenKind),
}

impl TokenError {
    /// Wrap an I/O failure on `path`.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure is a permission-type error, which is expected on
    /// read-only installations and not worth a warning.
    pub fn is_permission(&self) -> bool {
        match self {
            Self::Persistence { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::ReadOnlyFilesystem
            ),
            Self::Generation(_) | Self::NotProvisionable(_) => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
