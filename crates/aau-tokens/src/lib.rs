//! # aau-tokens
//!
//! Anonymous usage tokens and user-agent composition.
//!
//! - **Generator**: CSPRNG-backed 22-character tokens ([`generator::TokenGenerator`])
//! - **Store**: read-validate-or-generate-and-persist cache files ([`store::TokenStore`])
//! - **Registry**: assembles every token kind ([`registry::TokenRegistry`])
//! - **Composer**: renders the ordered suffix ([`composer::compose`])
//! - **Context**: the per-process bundle hosts hold ([`context::AnonUsageContext`])
//!
//! ## Crate Position
//!
//! Depends on aau-core and aau-settings. Depended on by aau-heartbeat and aau-cli.

#![deny(unsafe_code)]

pub mod composer;
pub mod context;
pub mod errors;
pub mod generator;
pub mod identity;
pub mod kind;
pub mod registry;
pub mod store;
pub mod system;

pub use composer::{UserAgentSuffix, append_to_user_agent, build_suffix, compose, redact};
pub use context::AnonUsageContext;
pub use errors::TokenError;
pub use generator::{EntropySource, OsEntropy, TokenGenerator, random_token};
pub use identity::{ApiKeyIdentity, ApiKeyLocations, IdentitySource, NoIdentity, StaticIdentity};
pub use kind::{Token, TokenKind};
pub use registry::{RegistryConfig, TokenRegistry, TokenSet};
pub use store::TokenStore;
pub use system::{SystemTokenSources, provision_system_token, system_tokens};
