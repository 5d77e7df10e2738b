//! Cloud identity token.
//!
//! When the user is signed in to the cloud service, the subject of their API
//! key (a UUID) is encoded as the `a/` token. The key is looked up in the
//! environment, then a secrets directory, then the keyring. Keyring content
//! itself may be injected the same way before the local keyring file is read.
//!
//! The key's signature is never verified here; only its shape and expiry are
//! checked.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Environment variable (and secret file name) holding the API key.
pub const ENV_API_KEY: &str = "AAU_AUTH_API_KEY";
/// Environment variable (and secret file name) naming the keyring domain.
pub const ENV_AUTH_DOMAIN: &str = "AAU_AUTH_DOMAIN";
/// Environment variable (and secret file name) holding keyring JSON.
pub const ENV_AUTH_KEYRING: &str = "AAU_AUTH_KEYRING";
/// Environment variable overriding the secrets directory.
pub const ENV_SECRETS_DIR: &str = "AAU_SECRETS_DIR";
/// Environment variable overriding the keyring file location.
pub const ENV_KEYRING_PATH: &str = "AAU_KEYRING_PATH";

const DEFAULT_SECRETS_DIR: &str = "/run/secrets";
const KEYRING_NAME: &str = "Anaconda Cloud";
const KEYRING_DOMAINS: [&str; 2] = ["anaconda.com", "anaconda.cloud"];

/// JWT segments and keyring records may or may not carry padding.
const PADDING_INDIFFERENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, PADDING_INDIFFERENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, PADDING_INDIFFERENT);

/// Supplies the cloud token, if the user is signed in.
pub trait IdentitySource: Send + Sync {
    /// The encoded identity, or `None` without a valid signed-in identity.
    fn cloud_token(&self) -> Option<String>;
}

/// No identity is ever available.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoIdentity;

impl IdentitySource for NoIdentity {
    fn cloud_token(&self) -> Option<String> {
        None
    }
}

/// A fixed identity, for hosts that resolve it themselves.
#[derive(Clone, Debug)]
pub struct StaticIdentity(pub Option<String>);

impl IdentitySource for StaticIdentity {
    fn cloud_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Where an API key may be found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiKeyLocations {
    /// Key passed directly through the environment.
    pub env_key: Option<String>,
    /// Domain selecting the keyring record.
    pub domain: Option<String>,
    /// Keyring JSON passed directly through the environment.
    pub keyring: Option<String>,
    /// Directory of secret files.
    pub secrets_dir: PathBuf,
    /// Keyring JSON file.
    pub keyring_path: PathBuf,
}

impl ApiKeyLocations {
    /// Locations derived from the process environment.
    pub fn from_env(home: &Path) -> Self {
        Self::from_lookup(home, |key| std::env::var(key).ok())
    }

    /// Locations derived through an arbitrary lookup.
    pub fn from_lookup(home: &Path, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            env_key: non_empty(ENV_API_KEY),
            domain: non_empty(ENV_AUTH_DOMAIN),
            keyring: non_empty(ENV_AUTH_KEYRING),
            secrets_dir: non_empty(ENV_SECRETS_DIR)
                .map_or_else(|| PathBuf::from(DEFAULT_SECRETS_DIR), PathBuf::from),
            keyring_path: non_empty(ENV_KEYRING_PATH)
                .map_or_else(|| home.join(".anaconda").join("keyring"), PathBuf::from),
        }
    }

    /// Find the API key, first location wins.
    pub fn api_key(&self) -> Option<String> {
        if let Some(key) = &self.env_key {
            debug!("API key found in environment");
            return Some(key.clone());
        }
        if let Some(key) = self.secret(ENV_API_KEY) {
            debug!("API key found in secrets directory");
            return Some(key);
        }
        let content = self.keyring_content()?;
        let domain = self.domain.clone().or_else(|| self.secret(ENV_AUTH_DOMAIN));
        keyring_api_key(&content, domain.as_deref())
    }

    fn keyring_content(&self) -> Option<String> {
        if let Some(content) = &self.keyring {
            debug!("keyring found in environment");
            return Some(content.clone());
        }
        if let Some(content) = self.secret(ENV_AUTH_KEYRING) {
            debug!("keyring found in secrets directory");
            return Some(content);
        }
        read_trimmed(&self.keyring_path)
    }

    fn secret(&self, name: &str) -> Option<String> {
        read_trimmed(&self.secrets_dir.join(name))
            .or_else(|| read_trimmed(&self.secrets_dir.join(name.to_lowercase())))
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let content = content.trim_end();
            (!content.is_empty()).then(|| content.to_string())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not read credential file");
            None
        }
    }
}

/// Identity from the cloud API key.
#[derive(Clone, Debug)]
pub struct ApiKeyIdentity {
    locations: ApiKeyLocations,
}

impl ApiKeyIdentity {
    /// Look up API keys at `locations`.
    pub fn new(locations: ApiKeyLocations) -> Self {
        Self { locations }
    }
}

impl IdentitySource for ApiKeyIdentity {
    fn cloud_token(&self) -> Option<String> {
        let key = self.locations.api_key()?;
        jwt_to_token(&key, chrono::Utc::now().timestamp())
    }
}

/// Extract the API key for a domain from keyring JSON.
///
/// Without an explicit domain the first known domain present is used.
pub fn keyring_api_key(keyring: &str, domain: Option<&str>) -> Option<String> {
    let parsed: Value = match serde_json::from_str(keyring) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "keyring is not valid JSON");
            return None;
        }
    };
    let domains = parsed.get(KEYRING_NAME)?.as_object()?;
    let domain = domain.unwrap_or_else(|| {
        KEYRING_DOMAINS
            .into_iter()
            .find(|d| domains.contains_key(*d))
            .unwrap_or(KEYRING_DOMAINS[0])
    });
    let Some(record) = domains.get(domain).and_then(Value::as_str) else {
        debug!(domain, "API key not found for domain");
        return None;
    };
    let decoded = STANDARD_LENIENT
        .decode(record.trim())
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok());
    let api_key = decoded
        .as_ref()
        .and_then(|v| v.get("api_key"))
        .and_then(Value::as_str)
        .map(str::to_string);
    if api_key.is_some() {
        debug!(domain, "API key found in keyring");
    } else {
        debug!(domain, "keyring record could not be decoded");
    }
    api_key
}

/// Convert an API key into the cloud token, or `None` if it is not a
/// current JWT whose subject is a UUID.
///
/// `now` is the current Unix time in seconds.
pub fn jwt_to_token(key: &str, now: i64) -> Option<String> {
    match check_jwt(key, now) {
        Ok(token) => Some(token),
        Err(reason) => {
            debug!(reason, "API key rejected");
            None
        }
    }
}

fn check_jwt(key: &str, now: i64) -> Result<String, &'static str> {
    let parts: Vec<&str> = key.trim().split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err("expected three parts");
    }
    let segment = |s: &str| -> Result<Value, &'static str> {
        let bytes = URL_SAFE_LENIENT.decode(s).map_err(|_| "invalid base64")?;
        serde_json::from_slice(&bytes).map_err(|_| "invalid JSON")
    };
    let header = segment(parts[0])?;
    let payload = segment(parts[1])?;
    let _signature = URL_SAFE_LENIENT
        .decode(parts[2])
        .map_err(|_| "invalid signature encoding")?;

    if header.get("typ").and_then(Value::as_str) != Some("JWT") {
        return Err("invalid header");
    }
    let exp = payload
        .get("exp")
        .and_then(Value::as_i64)
        .filter(|exp| *exp > 0)
        .ok_or("invalid expiration")?;
    if exp < now {
        return Err("expired");
    }
    let sub = payload
        .get("sub")
        .and_then(Value::as_str)
        .ok_or("invalid subscriber")?;
    let sub = Uuid::parse_str(sub).map_err(|_| "subscriber is not a UUID")?;
    Ok(URL_SAFE_NO_PAD.encode(sub.as_bytes()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
