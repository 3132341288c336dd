// ## 📂 File: `src/stream/io.rs`
// ## Normalized I/O + ordered plaintext writer

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::stream::chunk_worker::DecryptedChunk;
use crate::types::DecodeError;

/// Canonical input abstraction
pub enum InputSource {
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Memory(Vec<u8>),
}

/// Canonical output abstraction
pub enum OutputSink {
    /// Stream straight into a caller writer.
    Writer(Box<dyn Write + Send>),
    /// Write a temp file next to `path`, renamed into place only on success.
    File(PathBuf),
    /// Collect into memory, returned in the telemetry snapshot.
    Memory,
}

/// Byte cursor over the container that tracks how much has been consumed.
pub struct ContainerReader<R: Read> {
    inner: R,
    consumed: u64,
    total_len: Option<u64>,
}

impl<R: Read> ContainerReader<R> {
    pub fn new(inner: R, total_len: Option<u64>) -> Self {
        Self {
            inner,
            consumed: 0,
            total_len,
        }
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn total_len(&self) -> Option<u64> {
        self.total_len
    }

    /// Bytes left before EOF, when the input length is known.
    pub fn remaining(&self) -> Option<u64> {
        self.total_len.map(|t| t.saturating_sub(self.consumed))
    }
}

impl<R: Read> Read for ContainerReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n as u64;
        Ok(n)
    }
}

pub type BoxedContainerReader = ContainerReader<Box<dyn Read + Send>>;

/// Normalize input source into a counted reader; length is known for files and memory.
pub fn open_input(src: InputSource) -> Result<BoxedContainerReader, DecodeError> {
    let reader = match src {
        InputSource::Reader(r) => ContainerReader::new(r, None),
        InputSource::File(p) => {
            let file = File::open(&p)?;
            let len = file.metadata()?.len();
            let boxed: Box<dyn Read + Send> = Box::new(BufReader::new(file));
            ContainerReader::new(boxed, Some(len))
        }
        InputSource::Memory(b) => {
            let len = b.len() as u64;
            let boxed: Box<dyn Read + Send> = Box::new(Cursor::new(b));
            ContainerReader::new(boxed, Some(len))
        }
    };
    Ok(reader)
}

/// Opened output; nothing reaches a file destination before `commit`.
pub enum DecodeOutput {
    Stream(Box<dyn Write + Send>),
    Staged {
        temp: BufWriter<NamedTempFile>,
        dest: PathBuf,
    },
    Memory(Vec<u8>),
}

/// Normalize output sink. File sinks stage into a temp file in the destination directory.
pub fn open_output(sink: OutputSink) -> Result<DecodeOutput, DecodeError> {
    match sink {
        OutputSink::Writer(w) => Ok(DecodeOutput::Stream(w)),
        OutputSink::File(dest) => {
            let dir = staging_dir(&dest);
            let temp = NamedTempFile::new_in(dir)?;
            log::debug!("staging output in {}", temp.path().display());
            Ok(DecodeOutput::Staged {
                temp: BufWriter::new(temp),
                dest,
            })
        }
        OutputSink::Memory => Ok(DecodeOutput::Memory(Vec::new())),
    }
}

fn staging_dir(dest: &Path) -> &Path {
    match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

impl DecodeOutput {
    pub fn writer(&mut self) -> &mut (dyn Write + Send) {
        match self {
            DecodeOutput::Stream(w) => w.as_mut(),
            DecodeOutput::Staged { temp, .. } => temp,
            DecodeOutput::Memory(buf) => buf,
        }
    }

    /// Flush and publish. Returns the buffer for memory sinks.
    pub fn commit(self) -> Result<Option<Vec<u8>>, DecodeError> {
        match self {
            DecodeOutput::Stream(mut w) => {
                w.flush()?;
                Ok(None)
            }
            DecodeOutput::Staged { temp, dest } => {
                let temp = temp.into_inner().map_err(|e| e.into_error())?;
                temp.as_file().sync_all()?;
                temp.persist(&dest).map_err(|e| e.error)?;
                log::info!("output committed to {}", dest.display());
                Ok(None)
            }
            DecodeOutput::Memory(buf) => Ok(Some(buf)),
        }
    }

    /// Drop staged data. Dropping the temp file deletes it.
    pub fn discard(self) {
        if let DecodeOutput::Staged { dest, .. } = &self {
            log::warn!("discarding partial output for {}", dest.display());
        }
    }
}

// ================= Ordered writer =================

/// Restores file order for chunks finishing out of order.
///
/// Holds whatever arrives early; the parallel pipeline keeps that under its
/// reorder window by withholding read credits.
pub struct OrderedPlaintextWriter<'a, W: Write + ?Sized> {
    out: &'a mut W,
    next: u64,
    pending: BTreeMap<u64, DecryptedChunk>,
    written: u64,
}

impl<'a, W: Write + ?Sized> OrderedPlaintextWriter<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Self {
            out,
            next: 0,
            pending: BTreeMap::new(),
            written: 0,
        }
    }

    /// Queue a chunk and write every chunk that is now contiguous.
    /// Returns the number of chunks written by this call.
    pub fn push(&mut self, chunk: DecryptedChunk) -> Result<usize, DecodeError> {
        if chunk.seq < self.next || self.pending.contains_key(&chunk.seq) {
            return Err(DecodeError::Pipeline(format!(
                "duplicate chunk position {}",
                chunk.seq
            )));
        }
        self.pending.insert(chunk.seq, chunk);
        self.flush_ready()
    }

    /// Chunks written so far, in order.
    pub fn next_seq(&self) -> u64 {
        self.next
    }

    /// Validate that exactly `expected` chunks were written with no gaps left.
    pub fn finish(&mut self, expected: u64) -> Result<u64, DecodeError> {
        self.flush_ready()?;

        if !self.pending.is_empty() || self.next != expected {
            return Err(DecodeError::Pipeline(format!(
                "ordered writer stopped at {} of {} sections ({} pending)",
                self.next,
                expected,
                self.pending.len()
            )));
        }

        Ok(self.written)
    }

    fn flush_ready(&mut self) -> Result<usize, DecodeError> {
        let mut n = 0;
        while let Some(chunk) = self.pending.remove(&self.next) {
            self.out.write_all(&chunk.plaintext)?;
            self.written += chunk.plaintext.len() as u64;
            self.next += 1;
            n += 1;
        }
        Ok(n)
    }
}
