// ## 📂 File: `src/crypto/aead.rs`

//! AEAD interface for ChaCha20-Poly1305 (IETF, 96-bit nonce).
//!
//! Design notes:
//! - 32-byte key, 12-byte nonce, 16-byte tag.
//! - Tag verification fails closed: no partial plaintext is ever returned.
//! - Caller provides nonce and AAD per section; the adapter holds only the key schedule.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

use crate::crypto::key::SongKey;
use crate::crypto::types::{CryptoError, KEY_LEN_32, NONCE_LEN_12, TAG_LEN};

/// Opening capability shared by every section decoder and chunk worker.
///
/// `ciphertext_and_tag` is the ciphertext immediately followed by its tag.
pub trait SectionAead: Send + Sync {
    fn open(
        &self,
        nonce_12: &[u8],
        aad: &[u8],
        ciphertext_and_tag: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;
}

#[derive(Clone)]
pub struct ChaChaAead {
    cipher: ChaCha20Poly1305,
}

impl ChaChaAead {
    pub fn new(key: &SongKey) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key.as_bytes())),
        }
    }

    pub fn from_slice(key: &[u8]) -> Result<Self, CryptoError> {
        let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|_| {
            CryptoError::InvalidKeyLen {
                expected: KEY_LEN_32,
                actual: key.len(),
            }
        })?;
        Ok(Self { cipher })
    }
}

impl std::fmt::Debug for ChaChaAead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChaChaAead(..)")
    }
}

impl SectionAead for ChaChaAead {
    fn open(
        &self,
        nonce_12: &[u8],
        aad: &[u8],
        ciphertext_and_tag: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if nonce_12.len() != NONCE_LEN_12 {
            return Err(CryptoError::InvalidNonceLen {
                expected: NONCE_LEN_12,
                actual: nonce_12.len(),
            });
        }

        if ciphertext_and_tag.len() < TAG_LEN {
            return Err(CryptoError::CiphertextTooShort {
                actual: ciphertext_and_tag.len(),
            });
        }

        self.cipher
            .decrypt(
                Nonce::from_slice(nonce_12),
                Payload {
                    msg: ciphertext_and_tag,
                    aad,
                },
            )
            .map_err(|_| CryptoError::TagMismatch)
    }
}

/// One-shot `decrypt(ciphertext‖tag, aad, nonce, key)`.
pub fn aead_decrypt(
    ciphertext_and_tag: &[u8],
    aad: &[u8],
    nonce_12: &[u8],
    key: &SongKey,
) -> Result<Vec<u8>, CryptoError> {
    ChaChaAead::new(key).open(nonce_12, aad, ciphertext_and_tag)
}
