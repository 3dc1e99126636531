// Password-reset token generation and hashing
//
// Only the SHA-256 hash of a reset token is ever persisted; the raw token
// leaves the process exactly once, inside the reset link handed to the
// mailer.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Reset tokens are valid for 20 minutes
pub const RESET_TOKEN_TTL_MINUTES: i64 = 20;

/// Raw token entropy in bytes (256 bits)
pub const RESET_TOKEN_BYTES: usize = 32;

/// Generate a cryptographically random reset token, hex-encoded
pub fn generate_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 hash of a raw token, hex-encoded, as stored in the user record
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
