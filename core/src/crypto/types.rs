// ## 📂 File: `src/crypto/types.rs`

use thiserror::Error;

/// ChaCha20-Poly1305 key length.
pub const KEY_LEN_32: usize = 32;

/// IETF ChaCha20-Poly1305 nonce length.
pub const NONCE_LEN_12: usize = 12;

/// Fixed AEAD tag length (bytes).
pub const TAG_LEN: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid key length provided to cipher.
    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidKeyLen { expected: usize, actual: usize },

    /// Nonce length mismatch (must be 12 bytes).
    #[error("invalid nonce length: expected={expected}, actual={actual}")]
    InvalidNonceLen { expected: usize, actual: usize },

    /// Input shorter than a tag.
    #[error("ciphertext too short: {actual} bytes, shorter than the 16-byte tag")]
    CiphertextTooShort { actual: usize },

    /// AEAD tag mismatch (authentication failure).
    #[error("AEAD tag mismatch")]
    TagMismatch,
}
