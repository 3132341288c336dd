//! Test-side container builder.
//!
//! Seals header, metadata, chunks and the remainder the way the producer does,
//! so decode tests can run against real containers.
#![allow(dead_code)]

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::{Rng, RngCore, SeedableRng};
use rand::rngs::StdRng;
use sha2::{Digest, Sha256};

use songcrypt_core::constants::{CHUNK_SIZE, HEADER_AAD, METADATA_AAD, SECTION_OVERHEAD};
use songcrypt_core::crypto::SongKey;

pub const TEST_KEY: [u8; 32] = [7u8; 32];

pub fn test_key() -> SongKey {
    SongKey::from_bytes(TEST_KEY)
}

/// Canonical 44-byte PCM header declaring `data_size` payload bytes.
pub fn wave_header(data_size: u32) -> [u8; 44] {
    let mut h = [0u8; 44];
    h[0..4].copy_from_slice(b"RIFF");
    h[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    h[8..12].copy_from_slice(b"WAVE");
    h[12..16].copy_from_slice(b"fmt ");
    h[16..20].copy_from_slice(&16u32.to_le_bytes());
    h[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    h[22..24].copy_from_slice(&2u16.to_le_bytes()); // stereo
    h[24..28].copy_from_slice(&44_100u32.to_le_bytes());
    h[28..32].copy_from_slice(&(44_100u32 * 4).to_le_bytes());
    h[32..34].copy_from_slice(&4u16.to_le_bytes());
    h[34..36].copy_from_slice(&16u16.to_le_bytes());
    h[36..40].copy_from_slice(b"data");
    h[40..44].copy_from_slice(&data_size.to_le_bytes());
    h
}

/// Deterministic pseudo-random PCM.
pub fn pcm(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut buf = vec![0u8; len];
    rng.fill_bytes(&mut buf);
    buf
}

/// Seal one section as `[nonce][tag][ciphertext]`.
pub fn seal(key: &[u8; 32], nonce: [u8; 12], aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let ct_tag = cipher
        .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad })
        .expect("seal");
    let (ct, tag) = ct_tag.split_at(ct_tag.len() - 16);

    let mut out = Vec::with_capacity(SECTION_OVERHEAD + ct.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(tag);
    out.extend_from_slice(ct);
    out
}

/// Seal one section as `[nonce][ciphertext][tag]`, the producer's header layout.
pub fn seal_tag_last(key: &[u8; 32], nonce: [u8; 12], aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let sealed = seal(key, nonce, aad, plaintext);
    let mut out = sealed[..12].to_vec();
    out.extend_from_slice(&sealed[SECTION_OVERHEAD..]);
    out.extend_from_slice(&sealed[12..SECTION_OVERHEAD]);
    out
}

/// Byte ranges of each section inside a built container.
#[derive(Debug, Clone)]
pub struct Layout {
    pub header: std::ops::Range<usize>,
    pub metadata: std::ops::Range<usize>,
    /// Full chunks followed by the remainder.
    pub chunks: Vec<std::ops::Range<usize>>,
}

#[derive(Debug, Clone)]
pub struct BuiltContainer {
    pub bytes: Vec<u8>,
    pub wave: [u8; 44],
    pub pcm: Vec<u8>,
    pub digest: [u8; 32],
    pub layout: Layout,
}

impl BuiltContainer {
    /// What a successful decode must produce.
    pub fn expected_output(&self) -> Vec<u8> {
        let mut out = self.wave.to_vec();
        out.extend_from_slice(&self.pcm);
        out
    }
}

pub struct ContainerBuilder {
    key: [u8; 32],
    pcm: Vec<u8>,
    wave: Option<[u8; 44]>,
    metadata_extra: Vec<u8>,
    metadata_size_override: Option<u32>,
    chunk_digest_override: Option<[u8; 32]>,
    chunk_digest_at: Vec<(usize, [u8; 32])>,
    header_tag_last: bool,
    zero_nonces: bool,
    seed: u64,
}

impl ContainerBuilder {
    pub fn new(pcm: Vec<u8>) -> Self {
        Self {
            key: TEST_KEY,
            pcm,
            wave: None,
            metadata_extra: b"{\"title\":\"test\"}".to_vec(),
            metadata_size_override: None,
            chunk_digest_override: None,
            chunk_digest_at: Vec::new(),
            header_tag_last: false,
            zero_nonces: false,
            seed: 1,
        }
    }

    pub fn key(mut self, key: [u8; 32]) -> Self {
        self.key = key;
        self
    }

    pub fn wave(mut self, wave: [u8; 44]) -> Self {
        self.wave = Some(wave);
        self
    }

    pub fn metadata_extra(mut self, extra: Vec<u8>) -> Self {
        self.metadata_extra = extra;
        self
    }

    /// Declare a metadata size in the header that differs from the real one.
    pub fn declare_metadata_size(mut self, size: u32) -> Self {
        self.metadata_size_override = Some(size);
        self
    }

    /// Seal chunks under a digest other than the one stored in metadata.
    pub fn chunk_digest(mut self, digest: [u8; 32]) -> Self {
        self.chunk_digest_override = Some(digest);
        self
    }

    /// Seal only chunk `number` (1-based, like `Section::Chunk`) under `digest`.
    pub fn chunk_digest_at(mut self, number: usize, digest: [u8; 32]) -> Self {
        self.chunk_digest_at.push((number, digest));
        self
    }

    /// Put the header tag after the ciphertext.
    pub fn header_tag_last(mut self) -> Self {
        self.header_tag_last = true;
        self
    }

    pub fn zero_nonces(mut self) -> Self {
        self.zero_nonces = true;
        self
    }

    pub fn build(self) -> BuiltContainer {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut next_nonce = || {
            if self.zero_nonces {
                [0u8; 12]
            } else {
                rng.gen::<[u8; 12]>()
            }
        };

        let wave = self.wave.unwrap_or_else(|| wave_header(self.pcm.len() as u32));
        let payload_size = u32::from_le_bytes([wave[40], wave[41], wave[42], wave[43]]) as usize;

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(&self.pcm));
        let mut metadata = digest.to_vec();
        metadata.extend_from_slice(&self.metadata_extra);
        let metadata_size = self
            .metadata_size_override
            .unwrap_or(metadata.len() as u32);

        let mut header_pt = wave.to_vec();
        header_pt.extend_from_slice(&metadata_size.to_le_bytes());

        let mut bytes = if self.header_tag_last {
            seal_tag_last(&self.key, next_nonce(), HEADER_AAD, &header_pt)
        } else {
            seal(&self.key, next_nonce(), HEADER_AAD, &header_pt)
        };
        let header = 0..bytes.len();

        let meta_start = bytes.len();
        bytes.extend(seal(&self.key, next_nonce(), METADATA_AAD, &metadata));
        let metadata_range = meta_start..bytes.len();

        let chunk_aad = self.chunk_digest_override.unwrap_or(digest);
        let full = payload_size / CHUNK_SIZE;
        let rem = payload_size % CHUNK_SIZE;

        let mut chunks = Vec::with_capacity(full + 1);
        let overrides = &self.chunk_digest_at;
        let mut sealed_chunk = |bytes: &mut Vec<u8>, number: usize, pt: &[u8], nonce: [u8; 12]| {
            let aad = overrides
                .iter()
                .find(|(n, _)| *n == number)
                .map(|(_, d)| *d)
                .unwrap_or(chunk_aad);
            let start = bytes.len();
            bytes.extend(seal(&self.key, nonce, &aad, pt));
            chunks.push(start..bytes.len());
        };

        for i in 0..full {
            let pt = &self.pcm[i * CHUNK_SIZE..(i + 1) * CHUNK_SIZE];
            sealed_chunk(&mut bytes, i + 1, pt, next_nonce());
        }
        let tail = &self.pcm[full * CHUNK_SIZE..full * CHUNK_SIZE + rem];
        sealed_chunk(&mut bytes, full + 1, tail, next_nonce());

        BuiltContainer {
            bytes,
            wave,
            pcm: self.pcm[..payload_size].to_vec(),
            digest,
            layout: Layout {
                header,
                metadata: metadata_range,
                chunks,
            },
        }
    }
}

/// Build a container around `len` bytes of seeded PCM.
pub fn container(len: usize, seed: u64) -> BuiltContainer {
    ContainerBuilder::new(pcm(len, seed)).build()
}
