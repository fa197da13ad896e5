//! Opaque random credentials (refresh tokens, session identifiers)

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Random token generator backed by the OS CSPRNG
pub struct RandomTokenGenerator;

impl RandomTokenGenerator {
    /// Generate an alphanumeric token of `length` characters
    pub fn generate(length: usize) -> String {
        OsRng
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }

    /// SHA-256 digest (hex) used as the storage key for a token
    pub fn hash(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
