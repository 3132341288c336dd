use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use bytes::Bytes;

use crate::crypto::SectionAead;
use crate::framing::{FrameError, SealedSection, Section};
use crate::headers::ContentDigest;
use crate::telemetry::TelemetryCounters;

/// Sealed chunk handed from the reader to a worker.
#[derive(Debug, Clone)]
pub struct ChunkInput {
    /// 0-based position in the chunk stage; the ordering key.
    pub seq: u64,
    pub sealed: SealedSection,
}

/// Verified chunk plaintext.
#[derive(Debug, Clone)]
pub struct DecryptedChunk {
    pub seq: u64,
    pub section: Section,
    pub plaintext: Bytes,
    pub telemetry: TelemetryCounters,
    pub decrypt_time: Duration,
}

/// Worker failure, tagged with the chunk position it belongs to.
#[derive(Debug)]
pub struct ChunkFailure {
    pub seq: u64,
    pub error: FrameError,
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ChunkFailure {}

/// Immutable crypto context shared across workers.
///
/// The digest is write-once: fixed when the metadata section verifies.
#[derive(Clone)]
pub struct ChunkCryptoContext {
    pub aead: Arc<dyn SectionAead>,
    pub digest: ContentDigest,
}

impl ChunkCryptoContext {
    pub fn new(aead: Arc<dyn SectionAead>, digest: ContentDigest) -> Self {
        Self { aead, digest }
    }
}

impl fmt::Debug for ChunkCryptoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkCryptoContext")
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}
