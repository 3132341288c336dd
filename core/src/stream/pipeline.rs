// ## 📂 File: `src/stream/pipeline.rs`
// ## Chunk stage wiring: reader -> workers -> ordered writer

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::bounded;

use crate::framing::{read_section, FrameError};
use crate::stream::chunk_worker::{
    ChunkCryptoContext, ChunkFailure, ChunkInput, DecryptChunkWorker, DecryptedChunk,
};
use crate::stream::chunking::ChunkPlan;
use crate::stream::io::OrderedPlaintextWriter;
use crate::stream::parallelism::ParallelismProfile;
use crate::telemetry::{Stage, TelemetryCounters, TelemetryTimer};
use crate::types::DecodeError;

/// Decode every chunk section and the trailing remainder section into `writer`,
/// in file order. Stops at the first failure in file order: every section
/// before it reaches `writer`, and no plaintext of the failing section or any
/// later one does.
pub fn run_chunk_pipeline<R, W>(
    reader: &mut R,
    writer: &mut W,
    crypto: &ChunkCryptoContext,
    plan: &ChunkPlan,
    profile: &ParallelismProfile,
    timer: &mut TelemetryTimer,
) -> Result<TelemetryCounters, DecodeError>
where
    R: Read + Send + ?Sized,
    W: Write + ?Sized,
{
    log::info!(
        "chunk stage: {} chunks of {} bytes + remainder of {} bytes, {} worker(s)",
        plan.chunk_count,
        plan.chunk_size,
        plan.remainder_size,
        profile.worker_count
    );

    if profile.is_serial() {
        run_serial(reader, writer, crypto, plan, timer)
    } else {
        run_parallel(reader, writer, crypto, plan, profile, timer)
    }
}

// ============================================================
// Serial path
// ============================================================
fn run_serial<R, W>(
    reader: &mut R,
    writer: &mut W,
    crypto: &ChunkCryptoContext,
    plan: &ChunkPlan,
    timer: &mut TelemetryTimer,
) -> Result<TelemetryCounters, DecodeError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let worker = DecryptChunkWorker::new(crypto.clone());
    let mut ordered = OrderedPlaintextWriter::new(writer);
    let mut telemetry = TelemetryCounters::default();

    for seq in 0..plan.section_count() {
        let section = plan.section(seq);
        let len = plan.ciphertext_len(seq);

        let sealed = timer.time(Stage::Read, || read_section(&mut *reader, section, len))?;
        let chunk = worker
            .decrypt_chunk(ChunkInput { seq, sealed })
            .map_err(|f| DecodeError::from(f.error))?;

        record_chunk(&mut telemetry, timer, &chunk);
        timer.time(Stage::Write, || ordered.push(chunk))?;
    }

    let written = ordered.finish(plan.section_count())?;
    telemetry.add_plaintext(written);
    Ok(telemetry)
}

// ============================================================
// Parallel path
// ============================================================
fn run_parallel<R, W>(
    reader: &mut R,
    writer: &mut W,
    crypto: &ChunkCryptoContext,
    plan: &ChunkPlan,
    profile: &ParallelismProfile,
    timer: &mut TelemetryTimer,
) -> Result<TelemetryCounters, DecodeError>
where
    R: Read + Send + ?Sized,
    W: Write + ?Sized,
{
    let total = plan.section_count();
    let abort = AtomicBool::new(false);

    // ---- Channels ----
    let (seg_tx, seg_rx) = bounded::<ChunkInput>(profile.inflight_chunks);
    let (out_tx, out_rx) =
        bounded::<Result<DecryptedChunk, ChunkFailure>>(profile.inflight_chunks);

    // One credit per section the reader may have outstanding. The writer hands
    // credits back as it flushes, so the reorder buffer never exceeds the window.
    let window = profile.reorder_window();
    let (credit_tx, credit_rx) = bounded::<()>(window);
    for _ in 0..window {
        let _ = credit_tx.try_send(());
    }

    thread::scope(|scope| {
        let abort = &abort;

        // ---- Reader: sections are only locatable one after another ----
        let reader_handle = scope.spawn(move || -> Result<Duration, FrameError> {
            let mut read_time = Duration::ZERO;
            for seq in 0..total {
                if credit_rx.recv().is_err() {
                    log::debug!("reader: writer hung up before section {}", seq + 1);
                    break;
                }
                if abort.load(Ordering::Acquire) {
                    log::debug!("reader: abort requested before section {}", seq + 1);
                    break;
                }

                let t = Instant::now();
                let sealed = read_section(&mut *reader, plan.section(seq), plan.ciphertext_len(seq))?;
                read_time += t.elapsed();

                if seg_tx.send(ChunkInput { seq, sealed }).is_err() {
                    break;
                }
            }
            // seg_tx dropped here: workers drain and exit
            Ok(read_time)
        });

        // ---- Workers ----
        for i in 0..profile.worker_count {
            let worker = DecryptChunkWorker::new(crypto.clone());
            let rx = seg_rx.clone();
            let tx = out_tx.clone();
            scope.spawn(move || {
                log::trace!("chunk worker {i} starting");
                worker.run(rx, tx);
                log::trace!("chunk worker {i} finished");
            });
        }
        drop(seg_rx);
        drop(out_tx);

        // ---- Ordered writer ----
        let mut ordered = OrderedPlaintextWriter::new(writer);
        let mut telemetry = TelemetryCounters::default();
        // Lowest failing position seen so far, with its error.
        let mut failure: Option<(u64, DecodeError)> = None;

        for res in out_rx.iter() {
            match res {
                Ok(chunk) => {
                    if failure.as_ref().is_some_and(|(at, _)| chunk.seq >= *at) {
                        continue;
                    }
                    record_chunk(&mut telemetry, timer, &chunk);
                    match timer.time(Stage::Write, || ordered.push(chunk)) {
                        Ok(flushed) => {
                            for _ in 0..flushed {
                                let _ = credit_tx.try_send(());
                            }
                        }
                        Err(e) => {
                            abort.store(true, Ordering::Release);
                            failure = Some((ordered.next_seq(), e));
                            break;
                        }
                    }
                }
                Err(f) => {
                    log::warn!("chunk stage failed at position {}: {}", f.seq, f.error);
                    abort.store(true, Ordering::Release);
                    if failure.as_ref().map_or(true, |(at, _)| f.seq < *at) {
                        failure = Some((f.seq, f.error.into()));
                    }
                }
            }

            // Everything before the failing section is on disk; nothing after it may be.
            if failure.as_ref().is_some_and(|(at, _)| ordered.next_seq() >= *at) {
                break;
            }
        }

        if let Some((at, err)) = failure {
            log::debug!("ordered writer stopped before position {at}");
            // Hanging up unblocks workers, which in turn unblocks the reader.
            drop(credit_tx);
            drop(out_rx);
            return Err(err);
        }

        let read_time = reader_handle
            .join()
            .map_err(|_| DecodeError::Pipeline("reader thread panicked".into()))??;
        timer.add_stage_time(Stage::Read, read_time);

        let written = ordered.finish(total)?;
        telemetry.add_plaintext(written);
        Ok(telemetry)
    })
}

fn record_chunk(
    telemetry: &mut TelemetryCounters,
    timer: &mut TelemetryTimer,
    chunk: &DecryptedChunk,
) {
    telemetry.merge(&chunk.telemetry);
    timer.add_stage_time(Stage::Decrypt, chunk.decrypt_time);
    log::debug!("{} verified ({} bytes)", chunk.section, chunk.plaintext.len());
}
