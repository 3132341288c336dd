// ## 📂 File: `src/crypto/key.rs`

//! Key provisioning.
//!
//! The decoder never derives keys: a `KeyStore` hands over the 32-byte song key,
//! decoded from its hex text form. Key bytes are never logged or printed.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::crypto::types::KEY_LEN_32;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("cannot read key file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed key file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// 256-bit symmetric song key. Wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SongKey([u8; KEY_LEN_32]);

impl SongKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN_32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; KEY_LEN_32] = bytes.try_into().map_err(|_| KeyError::InvalidLength {
            expected: KEY_LEN_32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Parse 64 hex digits; surrounding whitespace is ignored.
    pub fn from_hex(text: &str) -> Result<Self, KeyError> {
        let raw = hex::decode(text.trim())?;
        Self::from_slice(&raw)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN_32] {
        &self.0
    }
}

impl fmt::Debug for SongKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SongKey(<redacted>)")
    }
}

impl Drop for SongKey {
    fn drop(&mut self) {
        self.0.fill(0);
    }
}

/// Source of the song key.
pub trait KeyStore {
    fn load_key(&self) -> Result<SongKey, KeyError>;
}

/// Key already held in memory.
#[derive(Debug, Clone)]
pub struct StaticKey(pub SongKey);

impl KeyStore for StaticKey {
    fn load_key(&self) -> Result<SongKey, KeyError> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
struct KeyFileBody {
    key: String,
}

/// `keys.json` style file: `{"key": "<64 hex digits>"}`.
#[derive(Debug, Clone)]
pub struct JsonKeyFile {
    path: PathBuf,
}

impl JsonKeyFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse key file contents without touching the filesystem.
    pub fn parse(text: &str) -> Result<SongKey, KeyError> {
        let body: KeyFileBody = serde_json::from_str(text)?;
        SongKey::from_hex(&body.key)
    }
}

impl KeyStore for JsonKeyFile {
    fn load_key(&self) -> Result<SongKey, KeyError> {
        let text = fs::read_to_string(&self.path).map_err(|source| KeyError::Io {
            path: self.path.clone(),
            source,
        })?;
        let key = Self::parse(&text)?;
        log::debug!("loaded song key from {}", self.path.display());
        Ok(key)
    }
}
