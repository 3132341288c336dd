//! songcrypt-core
//!
//! Decoder for chunked ChaCha20-Poly1305 song containers.
//! Pure Rust, no FFI.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;

pub mod crypto;
pub mod framing;
pub mod headers;
pub mod telemetry;

// Stream layer
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::crypto::{JsonKeyFile, KeyStore, SongKey, StaticKey};
    pub use crate::stream::{
        decrypt_container, decrypt_file, inspect_container, ContainerInfo, DecodeConfig,
        InputSource, OutputSink,
    };
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::{DecodeError, ErrorKind};
}
