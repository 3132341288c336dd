// # 📂 `src/stream/chunk_worker/decrypt.rs`

use std::time::Instant;
use crossbeam::channel::{Receiver, Sender};

use crate::framing::open_section;
use crate::stream::chunk_worker::types::{
    ChunkCryptoContext, ChunkFailure, ChunkInput, DecryptedChunk,
};
use crate::telemetry::TelemetryCounters;

pub struct DecryptChunkWorker {
    crypto: ChunkCryptoContext,
}

impl DecryptChunkWorker {
    pub fn new(crypto: ChunkCryptoContext) -> Self {
        Self { crypto }
    }

    /// Authenticate and decrypt one chunk or remainder section.
    pub fn decrypt_chunk(&self, input: ChunkInput) -> Result<DecryptedChunk, ChunkFailure> {
        let started = Instant::now();
        let sealed = &input.sealed;

        let plaintext = open_section(
            self.crypto.aead.as_ref(),
            sealed,
            self.crypto.digest.as_bytes(),
        )
        .map_err(|error| ChunkFailure {
            seq: input.seq,
            error,
        })?;

        let mut telemetry = TelemetryCounters::default();
        telemetry.add_section(sealed.section, sealed.ciphertext.len());

        Ok(DecryptedChunk {
            seq: input.seq,
            section: sealed.section,
            plaintext,
            telemetry,
            decrypt_time: started.elapsed(),
        })
    }

    /// Run the worker loop on the calling thread.
    ///
    /// Returns when the input channel closes or the collector hangs up. A
    /// failed section does not stop the loop: earlier positions may still be
    /// queued behind it and the collector needs them.
    pub fn run(
        self,
        rx: Receiver<ChunkInput>,
        tx: Sender<Result<DecryptedChunk, ChunkFailure>>,
    ) {
        while let Ok(input) = rx.recv() {
            if tx.send(self.decrypt_chunk(input)).is_err() {
                log::debug!("chunk collector gone, worker exiting");
                return;
            }
        }
    }
}
