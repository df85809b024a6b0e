//! API key token generation
//!
//! Generates cryptographically secure, hex-encoded key tokens.

use rand::RngCore;

use crate::domain::api_key::TOKEN_BYTES;

/// Generator for API key tokens
#[derive(Debug, Clone)]
pub struct ApiKeyGenerator {
    /// Number of random bytes per token
    token_bytes: usize,
}

impl ApiKeyGenerator {
    /// Create a generator producing tokens of the standard length
    pub fn new() -> Self {
        Self {
            token_bytes: TOKEN_BYTES,
        }
    }

    /// Set the number of random bytes
    pub fn with_token_bytes(mut self, bytes: usize) -> Self {
        self.token_bytes = bytes;
        self
    }

    /// Draw a fresh token: `token_bytes` random bytes, hex-encoded.
    ///
    /// At 256 bits of entropy collisions are astronomically unlikely; the
    /// caller still re-draws on a store-level uniqueness violation.
    pub fn generate(&self) -> String {
        let mut random_bytes = vec![0u8; self.token_bytes];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        hex::encode(random_bytes)
    }
}

impl Default for ApiKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}
