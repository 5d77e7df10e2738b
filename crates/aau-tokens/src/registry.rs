//! Token registry: assembles every token kind for one invocation.
//!
//! Each kind succeeds or is omitted on its own. A failure in one kind never
//! prevents the others from being reported, except under `AAU_RAISE`, where
//! the first failure is returned.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aau_core::DebugFlags;
use tracing::{debug, warn};

use crate::errors::TokenError;
use crate::generator::TokenGenerator;
use crate::identity::{ApiKeyIdentity, ApiKeyLocations, IdentitySource};
use crate::kind::{Token, TokenKind};
use crate::store::TokenStore;
use crate::system::{SystemTokenSources, system_tokens};

/// Name of the client and environment cache files.
pub const TOKEN_FILE: &str = "aau_token";

/// Environment variable naming the active environment prefix.
pub const ENV_PREFIX: &str = "CONDA_PREFIX";

/// Locations and fixed values used to resolve tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Value of the `aau/` token.
    pub version: String,
    /// Cache file for the client token.
    pub client_path: PathBuf,
    /// Active environment prefix; `None` omits the environment token.
    pub environment_prefix: Option<PathBuf>,
    /// Where organization and machine tokens are found.
    pub system: SystemTokenSources,
}

impl RegistryConfig {
    /// Configuration rooted at `home`, with no environment and no system tokens.
    pub fn new(home: &Path) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            client_path: client_token_path(home),
            environment_prefix: None,
            system: SystemTokenSources::default(),
        }
    }

    /// Configuration from the process environment.
    pub fn from_env(home: &Path) -> Self {
        Self {
            environment_prefix: std::env::var_os(ENV_PREFIX)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            system: SystemTokenSources::from_env(home),
            ..Self::new(home)
        }
    }

    /// Use `prefix` as the active environment.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.environment_prefix = Some(prefix.into());
        self
    }
}

/// Client token cache location under `home`.
pub fn client_token_path(home: &Path) -> PathBuf {
    home.join(".conda").join(TOKEN_FILE)
}

/// Environment token cache location for `prefix`.
pub fn environment_token_path(prefix: &Path) -> PathBuf {
    prefix.join("etc").join(TOKEN_FILE)
}

/// The user's home directory, from `HOME`.
pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from)
}

/// All tokens resolved for one invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenSet {
    /// Engine version.
    pub version: Option<Token>,
    /// Per-installation token.
    pub client: Option<Token>,
    /// Per-process token.
    pub session: Option<Token>,
    /// Per-environment token.
    pub environment: Option<Token>,
    /// Organization tokens, possibly several.
    pub organization: Vec<Token>,
    /// Machine tokens, possibly several.
    pub machine: Vec<Token>,
    /// Cloud identity token.
    pub cloud: Option<Token>,
}

impl TokenSet {
    /// Present tokens in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.version
            .iter()
            .chain(&self.client)
            .chain(&self.session)
            .chain(&self.environment)
            .chain(&self.organization)
            .chain(&self.machine)
            .chain(&self.cloud)
    }

    /// Whether no token is present.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// First token of `kind`, if any.
    pub fn get(&self, kind: TokenKind) -> Option<&Token> {
        self.iter().find(|t| t.kind == kind)
    }
}

/// Resolves tokens from the store, generator, and identity collaborators.
pub struct TokenRegistry {
    config: RegistryConfig,
    store: TokenStore,
    generator: TokenGenerator,
    identity: Arc<dyn IdentitySource>,
    flags: DebugFlags,
}

impl std::fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRegistry")
            .field("config", &self.config)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl TokenRegistry {
    /// Build a registry from explicit collaborators.
    pub fn new(
        config: RegistryConfig,
        generator: TokenGenerator,
        identity: Arc<dyn IdentitySource>,
        flags: DebugFlags,
    ) -> Self {
        Self {
            store: TokenStore::new(generator.clone(), flags.clone()),
            config,
            generator,
            identity,
            flags,
        }
    }

    /// Build a registry for this process: OS entropy, environment-derived
    /// locations, and the API key identity.
    pub fn from_env(flags: DebugFlags) -> Self {
        let home = home_dir();
        Self::new(
            RegistryConfig::from_env(&home),
            TokenGenerator::default(),
            Arc::new(ApiKeyIdentity::new(ApiKeyLocations::from_env(&home))),
            flags,
        )
    }

    /// The resolution inputs.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The underlying cache.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Resolve every kind.
    pub fn resolve(&self) -> Result<TokenSet, TokenError> {
        let version = Token::ephemeral(TokenKind::Version, self.config.version.as_str());
        let version = TokenKind::Version.is_valid(&version.value).then_some(version);

        let client = self.absorb(
            TokenKind::Client,
            self.store
                .load_or_create(&self.config.client_path, TokenKind::Client, None),
        )?;

        let session = self.absorb(
            TokenKind::Session,
            self.generator
                .generate()
                .map(|v| Token::ephemeral(TokenKind::Session, v)),
        )?;

        let environment = match &self.config.environment_prefix {
            Some(prefix) => self.absorb(
                TokenKind::Environment,
                self.store.load_or_create(
                    &environment_token_path(prefix),
                    TokenKind::Environment,
                    Some(prefix),
                ),
            )?,
            None => {
                debug!("no active environment, omitting environment token");
                None
            }
        };

        let cloud = self
            .identity
            .cloud_token()
            .filter(|v| TokenKind::Cloud.is_valid(v))
            .map(|v| Token::ephemeral(TokenKind::Cloud, v));

        let organization = system_tokens(&self.config.system, TokenKind::Organization, &self.store)?;
        let machine = system_tokens(&self.config.system, TokenKind::Machine, &self.store)?;

        Ok(TokenSet {
            version,
            client,
            session,
            environment,
            organization,
            machine,
            cloud,
        })
    }

    /// Write any deferred environment token whose prefix now exists.
    pub fn flush(&self) -> usize {
        self.store.flush_deferred()
    }

    fn absorb(&self, kind: TokenKind, result: Result<Token, TokenError>) -> Result<Option<Token>, TokenError> {
        match result {
            Ok(token) => Ok(Some(token)),
            Err(e) if self.flags.raise => Err(e),
            Err(e) => {
                warn!(%kind, error = %e, "token unavailable, omitting");
                Ok(None)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
