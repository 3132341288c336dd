//! Chunk-level workers.
//!
//! Once the digest is known, chunk sections are independent: each carries its
//! own nonce and tag and they all share one AAD. Workers are
//! - CPU-bound
//! - stateless between chunks
//! - free to finish out of order (the writer restores file order)

pub mod types;
pub mod decrypt;

pub use types::{ChunkCryptoContext, ChunkFailure, ChunkInput, DecryptedChunk};
pub use decrypt::DecryptChunkWorker;
