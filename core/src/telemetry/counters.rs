// ### `src/telemetry/counters.rs`

//! telemetry/counters.rs
//! Mutable counters used during a decode pass.
//!
//! Summary: collects section counts and byte counts.
//! Converted into an immutable TelemetrySnapshot when the decode finishes.
use serde::Serialize;

use crate::constants::SECTION_OVERHEAD;
use crate::framing::Section;

/// Deterministic counters collected during decoding
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TelemetryCounters {
    pub sections_header: u64,
    pub sections_metadata: u64,
    pub sections_chunk: u64,
    pub sections_remainder: u64,
    pub bytes_plaintext: u64,
    pub bytes_ciphertext: u64,
    /// Nonce + tag bytes across all sections.
    pub bytes_overhead: u64,
}

impl TelemetryCounters {
    /// Record one verified section with a `ciphertext_len`-byte body.
    pub fn add_section(&mut self, section: Section, ciphertext_len: usize) {
        match section {
            Section::Header => self.sections_header += 1,
            Section::Metadata => self.sections_metadata += 1,
            Section::Chunk(_) => self.sections_chunk += 1,
            Section::Remainder => self.sections_remainder += 1,
        }
        self.bytes_ciphertext += ciphertext_len as u64;
        self.bytes_overhead += SECTION_OVERHEAD as u64;
    }

    /// Record plaintext that reached the output sink.
    pub fn add_plaintext(&mut self, len: u64) {
        self.bytes_plaintext += len;
    }

    pub fn sections_total(&self) -> u64 {
        self.sections_header + self.sections_metadata + self.sections_chunk + self.sections_remainder
    }

    // Per-worker counters are merged once at the end:
    // no locks or atomics inside workers.
    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.sections_header += other.sections_header;
        self.sections_metadata += other.sections_metadata;
        self.sections_chunk += other.sections_chunk;
        self.sections_remainder += other.sections_remainder;

        self.bytes_plaintext += other.bytes_plaintext;
        self.bytes_ciphertext += other.bytes_ciphertext;
        self.bytes_overhead += other.bytes_overhead;
    }
}
