//! Random token generation.
//!
//! Tokens are 16 bytes from the operating system's CSPRNG, encoded as
//! base64url without padding (22 characters).

use std::fmt;
use std::sync::Arc;

use aau_core::constants::TOKEN_ENTROPY_BYTES;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::errors::TokenError;

/// A source of security-grade random bytes.
pub trait EntropySource: Send + Sync {
    /// Fill `buf` entirely, or fail without producing a partial value.
    fn fill(&self, buf: &mut [u8]) -> Result<(), TokenError>;
}

/// The operating system's random number generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), TokenError> {
        let mut rng = OsRng;
        rng.try_fill_bytes(buf)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }
}

/// Produces fresh token values.
#[derive(Clone)]
pub struct TokenGenerator {
    source: Arc<dyn EntropySource>,
}

impl fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGenerator").finish_non_exhaustive()
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(Arc::new(OsEntropy))
    }
}

impl TokenGenerator {
    /// Create a generator drawing from `source`.
    pub fn new(source: Arc<dyn EntropySource>) -> Self {
        Self { source }
    }

    /// Generate a new token value.
    pub fn generate(&self) -> Result<String, TokenError> {
        let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
        self.source.fill(&mut bytes)?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

/// Generate a token from the operating system's CSPRNG.
pub fn random_token() -> Result<String, TokenError> {
    TokenGenerator::default().generate()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use aau_core::constants::{TOKEN_LENGTH, is_token_char};
    use assert_matches::assert_matches;

    use super::*;

    struct Exhausted;

    impl EntropySource for Exhausted {
        fn fill(&self, _buf: &mut [u8]) -> Result<(), TokenError> {
            Err(TokenError::Generation("exhausted".into()))
        }
    }

    struct Zeros;

    impl EntropySource for Zeros {
        fn fill(&self, buf: &mut [u8]) -> Result<(), TokenError> {
            buf.fill(0);
            Ok(())
        }
    }

    #[test]
    fn tokens_have_fixed_length_and_alphabet() {
        for _ in 0..200 {
            let token = random_token().unwrap();
            assert_eq!(token.len(), TOKEN_LENGTH);
            assert!(token.chars().all(is_token_char), "bad token {token}");
        }
    }

    #[test]
    fn tokens_are_unique() {
        let tokens: HashSet<_> = (0..100).map(|_| random_token().unwrap()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn encoding_is_unpadded_base64url() {
        let generator = TokenGenerator::new(Arc::new(Zeros));
        assert_eq!(generator.generate().unwrap(), "AAAAAAAAAAAAAAAAAAAAAA");
    }

    #[test]
    fn exhausted_source_is_an_error() {
        let generator = TokenGenerator::new(Arc::new(Exhausted));
        assert_matches!(generator.generate(), Err(TokenError::Generation(_)));
    }
}
