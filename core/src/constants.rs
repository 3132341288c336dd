
//! Wire constants for the encrypted song container.
//!
//! All multi-byte integers in the container are little-endian.

use crate::crypto::types::{NONCE_LEN_12, TAG_LEN};

/// Cleartext nonce preceding every section.
pub const NONCE_SIZE: usize = NONCE_LEN_12;
/// Poly1305 tag preceding every section's ciphertext.
pub const MAC_SIZE: usize = TAG_LEN;
/// Per-section framing overhead: nonce + tag.
pub const SECTION_OVERHEAD: usize = NONCE_SIZE + MAC_SIZE;

/// Standard RIFF/WAVE header length.
pub const WAVE_HEADER_SIZE: usize = 44;
/// Little-endian `u32` appended to the wave header inside the header section.
pub const METADATA_SIZE_FIELD: usize = 4;
/// Plaintext length of the header section.
pub const HEADER_PLAINTEXT_SIZE: usize = WAVE_HEADER_SIZE + METADATA_SIZE_FIELD;

/// Plaintext bytes per full audio chunk.
pub const CHUNK_SIZE: usize = 16000;
/// Content digest carried at the start of the metadata plaintext.
pub const DIGEST_SIZE: usize = 32;

/// Associated data of the header section (NUL terminated).
pub const HEADER_AAD: &[u8] = b"wave_header\0";
/// Associated data of the metadata section (NUL terminated).
pub const METADATA_AAD: &[u8] = b"meta_data\0";

/// Upper bound for a declared metadata section (1 MiB).
pub const DEFAULT_MAX_METADATA_SIZE: usize = 1024 * 1024;

/// Default key file consulted by the CLI.
pub const DEFAULT_KEY_FILE: &str = "keys.json";

/// Hard cap on chunks buffered between reader, workers and writer.
pub const MAX_INFLIGHT_CHUNKS: usize = 256;
/// Share of available memory the chunk pipeline may hold in flight.
pub const INFLIGHT_MEM_FRACTION: f64 = 0.25;
