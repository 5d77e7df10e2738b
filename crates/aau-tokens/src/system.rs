//! Organization and machine tokens.
//!
//! These are installed out of band by administrators (often through device
//! management) and are only ever read by a regular run. Several may be
//! present along the search path; all valid values are reported.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::TokenError;
use crate::generator::TokenGenerator;
use crate::kind::{Token, TokenKind};
use crate::store::TokenStore;

/// Environment variable carrying an organization token.
pub const ENV_ORG_TOKEN: &str = "AAU_ORG_TOKEN";
/// Environment variable carrying a machine token.
pub const ENV_MACHINE_TOKEN: &str = "AAU_MACHINE_TOKEN";

/// File name of an organization token.
pub const ORG_TOKEN_FILE: &str = "org_token";
/// File name of a machine token.
pub const MACHINE_TOKEN_FILE: &str = "machine_token";

/// Cache file name for a system token kind, `None` for other kinds.
pub fn token_file_name(kind: TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::Organization => Some(ORG_TOKEN_FILE),
        TokenKind::Machine => Some(MACHINE_TOKEN_FILE),
        _ => None,
    }
}

/// Where system tokens are looked up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SystemTokenSources {
    /// Organization token from the environment.
    pub org_env: Option<String>,
    /// Machine token from the environment.
    pub machine_env: Option<String>,
    /// Directories searched, in order, for token files.
    pub search_dirs: Vec<PathBuf>,
}

impl SystemTokenSources {
    /// Sources derived from the process environment.
    pub fn from_env(home: &Path) -> Self {
        Self::from_lookup(home, |key| std::env::var(key).ok())
    }

    /// Sources derived through an arbitrary lookup.
    pub fn from_lookup(home: &Path, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            org_env: lookup(ENV_ORG_TOKEN).filter(|v| !v.is_empty()),
            machine_env: lookup(ENV_MACHINE_TOKEN).filter(|v| !v.is_empty()),
            search_dirs: search_path(home, lookup("XDG_CONFIG_HOME").as_deref()),
        }
    }

    fn env_value(&self, kind: TokenKind) -> Option<&str> {
        match kind {
            TokenKind::Organization => self.org_env.as_deref(),
            TokenKind::Machine => self.machine_env.as_deref(),
            _ => None,
        }
    }
}

/// Existing system configuration directories, in search order.
pub fn search_path(home: &Path, xdg_config_home: Option<&str>) -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from("/etc/conda"), PathBuf::from("/var/lib/conda")];
    if let Some(xdg) = xdg_config_home.filter(|x| !x.is_empty()) {
        candidates.push(Path::new(xdg).join("conda"));
    }
    candidates.push(home.join(".config").join("conda"));
    candidates.push(home.join(".conda"));

    let mut dirs: Vec<PathBuf> = Vec::new();
    for dir in candidates {
        if dir.is_dir() && !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

/// All valid tokens of a system `kind`, environment first, deduplicated.
///
/// Unreadable files are skipped; they only surface as errors under
/// [`aau_core::DebugFlags::raise`].
pub fn system_tokens(
    sources: &SystemTokenSources,
    kind: TokenKind,
    store: &TokenStore,
) -> Result<Vec<Token>, TokenError> {
    let Some(file_name) = token_file_name(kind) else {
        return Ok(Vec::new());
    };

    let mut tokens: Vec<Token> = Vec::new();
    if let Some(value) = sources.env_value(kind) {
        let value = value.trim();
        if kind.is_valid(value) {
            debug!(%kind, value = %value, "found token in environment");
            tokens.push(Token::ephemeral(kind, value));
        } else {
            debug!(%kind, value = %value, "invalid token in environment discarded");
        }
    }
    for dir in &sources.search_dirs {
        if let Some(value) = store.read_only(&dir.join(file_name), kind)? {
            if !tokens.iter().any(|t| t.value == value) {
                tokens.push(Token::persisted(kind, value));
            }
        }
    }
    if tokens.is_empty() {
        debug!(%kind, "no tokens found");
    }
    Ok(tokens)
}

/// Write a freshly generated system token into `dir`.
///
/// Administrative operation; overwrites any existing file.
pub fn provision_system_token(
    dir: &Path,
    kind: TokenKind,
    generator: &TokenGenerator,
) -> Result<(PathBuf, String), TokenError> {
    let Some(file_name) = token_file_name(kind) else {
        return Err(TokenError::NotProvisionable(kind));
    };
    let value = generator.generate()?;
    std::fs::create_dir_all(dir).map_err(|e| TokenError::persistence(dir, e))?;
    let path = dir.join(file_name);
    std::fs::write(&path, format!("{value}\n")).map_err(|e| TokenError::persistence(&path, e))?;
    debug!(%kind, path = %path.display(), "system token provisioned");
    Ok((path, value))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use aau_core::DebugFlags;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    use super::*;

    fn store() -> TokenStore {
        TokenStore::new(TokenGenerator::default(), DebugFlags::default())
    }

    fn values(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn nothing_installed_yields_nothing() {
        let sources = SystemTokenSources::default();
        assert!(system_tokens(&sources, TokenKind::Organization, &store()).unwrap().is_empty());
        assert!(system_tokens(&sources, TokenKind::Machine, &store()).unwrap().is_empty());
    }

    #[test]
    fn environment_then_files_deduplicated() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        std::fs::write(a.path().join(ORG_TOKEN_FILE), "org-from-file\n").unwrap();
        std::fs::write(b.path().join(ORG_TOKEN_FILE), "org-from-env").unwrap();

        let sources = SystemTokenSources {
            org_env: Some("org-from-env".into()),
            machine_env: None,
            search_dirs: vec![a.path().to_path_buf(), b.path().to_path_buf()],
        };
        let tokens = system_tokens(&sources, TokenKind::Organization, &store()).unwrap();
        assert_eq!(values(&tokens), ["org-from-env", "org-from-file"]);
        assert!(!tokens[0].persisted);
        assert!(tokens[1].persisted);
    }

    #[test]
    fn invalid_values_are_discarded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(MACHINE_TOKEN_FILE), "has spaces in it").unwrap();
        let sources = SystemTokenSources {
            org_env: None,
            machine_env: Some("x".repeat(37)),
            search_dirs: vec![dir.path().to_path_buf()],
        };
        assert!(system_tokens(&sources, TokenKind::Machine, &store()).unwrap().is_empty());
    }

    #[test]
    fn kinds_use_separate_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(MACHINE_TOKEN_FILE), "machine-1").unwrap();
        let sources = SystemTokenSources {
            search_dirs: vec![dir.path().to_path_buf()],
            ..SystemTokenSources::default()
        };
        assert!(system_tokens(&sources, TokenKind::Organization, &store()).unwrap().is_empty());
        assert_eq!(
            values(&system_tokens(&sources, TokenKind::Machine, &store()).unwrap()),
            ["machine-1"]
        );
    }

    #[test]
    fn unreadable_file_is_skipped_unless_raising() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(ORG_TOKEN_FILE)).unwrap();
        let sources = SystemTokenSources {
            org_env: Some("org-from-env".into()),
            machine_env: None,
            search_dirs: vec![dir.path().to_path_buf()],
        };
        assert_eq!(
            values(&system_tokens(&sources, TokenKind::Organization, &store()).unwrap()),
            ["org-from-env"]
        );

        let raising = TokenStore::new(
            TokenGenerator::default(),
            DebugFlags {
                raise: true,
                ..DebugFlags::default()
            },
        );
        assert_matches!(
            system_tokens(&sources, TokenKind::Organization, &raising),
            Err(TokenError::Persistence { .. })
        );
    }

    #[test]
    fn search_path_keeps_existing_directories_only() {
        let home = TempDir::new().unwrap();
        std::fs::create_dir_all(home.path().join(".conda")).unwrap();
        let dirs = search_path(home.path(), None);
        assert!(dirs.contains(&home.path().join(".conda")));
        assert!(!dirs.contains(&home.path().join(".config").join("conda")));
    }

    #[test]
    fn search_path_honors_xdg_config_home() {
        let home = TempDir::new().unwrap();
        let xdg = TempDir::new().unwrap();
        std::fs::create_dir_all(xdg.path().join("conda")).unwrap();
        let dirs = search_path(home.path(), xdg.path().to_str());
        assert!(dirs.contains(&xdg.path().join("conda")));
    }

    #[test]
    fn provisioned_token_is_discovered() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("conda");
        let (path, value) =
            provision_system_token(&target, TokenKind::Organization, &TokenGenerator::default())
                .unwrap();
        assert_eq!(path, target.join(ORG_TOKEN_FILE));

        let sources = SystemTokenSources {
            search_dirs: vec![target],
            ..SystemTokenSources::default()
        };
        assert_eq!(
            values(&system_tokens(&sources, TokenKind::Organization, &store()).unwrap()),
            [value.as_str()]
        );
    }

    #[test]
    fn only_system_kinds_can_be_provisioned() {
        let dir = TempDir::new().unwrap();
        assert_matches!(
            provision_system_token(dir.path(), TokenKind::Client, &TokenGenerator::default()),
            Err(TokenError::NotProvisionable(TokenKind::Client))
        );
    }
}
