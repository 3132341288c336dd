// ## 2️⃣ `core.rs`: container driver + stable public API

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::{
    constants::{DEFAULT_MAX_METADATA_SIZE, HEADER_PLAINTEXT_SIZE, SECTION_OVERHEAD},
    crypto::{ChaChaAead, KeyStore, SectionAead, SongKey},
    framing::{Section, SectionLayout},
    headers::{
        decode_container_header, decode_metadata, validate_metadata_size, ContainerHeader,
        Metadata, WaveSummary,
    },
    stream::{
        chunk_worker::ChunkCryptoContext,
        chunking::ChunkPlan,
        io::{open_input, open_output, ContainerReader, InputSource, OutputSink},
        parallelism::ParallelismProfile,
        pipeline::run_chunk_pipeline,
    },
    telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer},
    types::DecodeError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeConfig {
    /// `None` sizes the pool from the host.
    pub workers: Option<usize>,
    /// `None` derives channel capacity from the worker count or memory budget.
    pub inflight_chunks: Option<usize>,
    /// Check emitted payload bytes against the header's declared size.
    pub verify_payload_len: bool,
    pub max_metadata_size: usize,
    /// Tag position inside the header section. Metadata and chunks are always tag first.
    pub header_layout: SectionLayout,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            workers: None,
            inflight_chunks: None,
            verify_payload_len: true,
            max_metadata_size: DEFAULT_MAX_METADATA_SIZE,
            header_layout: SectionLayout::TagFirst,
        }
    }
}

impl DecodeConfig {
    /// Single-threaded decode, same bytes as any parallel run.
    pub fn serial() -> Self {
        Self {
            workers: Some(1),
            ..Self::default()
        }
    }

    pub fn with_header_layout(mut self, layout: SectionLayout) -> Self {
        self.header_layout = layout;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    pub fn profile(&self, plan: &ChunkPlan) -> ParallelismProfile {
        let mut profile = match self.workers {
            Some(n) => ParallelismProfile::with_workers(n),
            // Not worth a thread pool for a couple of sections.
            None if plan.section_count() <= 2 => ParallelismProfile::single_threaded(),
            None => ParallelismProfile::auto(plan.chunk_wire_len()),
        };
        if let Some(cap) = self.inflight_chunks {
            profile.inflight_chunks = cap.max(1);
        }
        profile
    }
}

/// Driver progress. Any error moves to `Failed`; there is no resumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Start,
    HeaderDecoded,
    MetadataDecoded,
    ChunkLoop { total: u64 },
    RemainderDecoded,
    Done,
    Failed,
}

/// Sequences header -> metadata -> chunks -> remainder over one read cursor.
pub struct ContainerDriver<R: Read> {
    reader: ContainerReader<R>,
    aead: Arc<dyn SectionAead>,
    config: DecodeConfig,
    state: DecodeState,
    header: Option<ContainerHeader>,
    metadata: Option<Metadata>,
    telemetry: TelemetryCounters,
    timer: TelemetryTimer,
    workers: usize,
}

impl<R: Read + Send> ContainerDriver<R> {
    pub fn new(reader: ContainerReader<R>, aead: Arc<dyn SectionAead>, config: DecodeConfig) -> Self {
        Self {
            reader,
            aead,
            config,
            state: DecodeState::Start,
            header: None,
            metadata: None,
            telemetry: TelemetryCounters::default(),
            timer: TelemetryTimer::new(),
            workers: 1,
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn header(&self) -> Option<&ContainerHeader> {
        self.header.as_ref()
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn chunk_plan(&self) -> Option<ChunkPlan> {
        self.header.as_ref().map(|h| ChunkPlan::new(h.payload_size as u64))
    }

    /// Header stage: 48-byte section under `"wave_header\0"`.
    pub fn decode_header(&mut self) -> Result<&ContainerHeader, DecodeError> {
        self.expect_state(DecodeState::Start)?;

        let res = self.timer.time(Stage::Decrypt, || {
            decode_container_header(&mut self.reader, self.aead.as_ref(), self.config.header_layout)
        });
        let header = self.guard(res)?;

        self.telemetry.add_section(Section::Header, HEADER_PLAINTEXT_SIZE);
        self.state = DecodeState::HeaderDecoded;
        Ok(self.header.insert(header))
    }

    /// Metadata stage: `metadata_size` bytes under `"meta_data\0"`.
    pub fn decode_metadata(&mut self) -> Result<&Metadata, DecodeError> {
        self.expect_state(DecodeState::HeaderDecoded)?;

        let declared = match self.header.as_ref().map(|h| h.metadata_size) {
            Some(size) => size,
            None => return Err(self.fail_state("header missing after header stage")),
        };
        let size = validate_metadata_size(declared, self.config.max_metadata_size)
            .map_err(DecodeError::from);
        let size = self.guard(size)?;

        let bounded = self.check_remaining(Section::Metadata, (SECTION_OVERHEAD + size) as u64);
        self.guard(bounded)?;

        let res = self.timer.time(Stage::Decrypt, || {
            decode_metadata(&mut self.reader, self.aead.as_ref(), size)
        });
        let metadata = self.guard(res)?;

        self.telemetry.add_section(Section::Metadata, size);
        self.state = DecodeState::MetadataDecoded;
        Ok(self.metadata.insert(metadata))
    }

    /// Chunk stage: every full chunk plus the remainder, under the content digest.
    /// Returns the payload bytes written.
    pub fn decode_chunks<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<u64, DecodeError> {
        self.expect_state(DecodeState::MetadataDecoded)?;

        let digest = self.metadata.as_ref().map(|m| m.content_digest());
        let (plan, digest) = match (self.chunk_plan(), digest) {
            (Some(plan), Some(digest)) => (plan, digest),
            _ => return Err(self.fail_state("metadata missing after metadata stage")),
        };

        if let Some(remaining) = self.reader.remaining() {
            if let Some((section, needed, available)) = plan.locate_truncation(remaining) {
                self.state = DecodeState::Failed;
                log::warn!("container ends inside {}", section);
                return Err(DecodeError::Truncated {
                    section,
                    needed,
                    available,
                });
            }
        }

        let crypto = ChunkCryptoContext::new(self.aead.clone(), digest);
        let profile = self.config.profile(&plan);
        self.workers = profile.worker_count;
        self.state = DecodeState::ChunkLoop {
            total: plan.chunk_count,
        };

        let res = run_chunk_pipeline(
            &mut self.reader,
            writer,
            &crypto,
            &plan,
            &profile,
            &mut self.timer,
        );
        let counters = self.guard(res)?;
        self.state = DecodeState::RemainderDecoded;

        let written = counters.bytes_plaintext;
        self.telemetry.merge(&counters);

        let verify = self.config.verify_payload_len;
        let check = self.timer.time(Stage::Validate, || {
            if verify && written != plan.payload_size {
                return Err(DecodeError::Format {
                    section: Section::Remainder,
                    reason: format!(
                        "emitted {} payload bytes, header declares {}",
                        written, plan.payload_size
                    ),
                });
            }
            Ok(())
        });
        self.guard(check)?;

        if let Some(extra) = self.reader.remaining().filter(|r| *r > 0) {
            log::warn!("ignoring {} trailing bytes after the remainder section", extra);
        }

        Ok(written)
    }

    /// Full decode into `writer`: wave header first, then the payload in order.
    pub fn decode_into<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<(), DecodeError> {
        let wave = self.decode_header()?.wave.clone();

        let res = self.timer.time(Stage::Write, || writer.write_all(wave.as_bytes()));
        self.guard(res.map_err(DecodeError::from))?;
        self.telemetry.add_plaintext(wave.as_bytes().len() as u64);

        self.decode_metadata()?;
        self.decode_chunks(writer)?;

        self.state = DecodeState::Done;
        log::info!("decode complete: {} bytes", self.telemetry.bytes_plaintext);
        Ok(())
    }

    pub fn snapshot(&mut self) -> TelemetrySnapshot {
        self.timer.finish();
        let payload = self.header.as_ref().map(|h| h.payload_size as u64).unwrap_or(0);
        TelemetrySnapshot::from(&self.telemetry, &self.timer, payload, self.workers)
    }

    fn expect_state(&self, want: DecodeState) -> Result<(), DecodeError> {
        if self.state != want {
            return Err(DecodeError::Pipeline(format!(
                "cannot run stage expecting {:?} from state {:?}",
                want, self.state
            )));
        }
        Ok(())
    }

    fn fail_state(&mut self, reason: &str) -> DecodeError {
        self.state = DecodeState::Failed;
        DecodeError::Pipeline(reason.to_string())
    }

    fn check_remaining(&self, section: Section, needed: u64) -> Result<(), DecodeError> {
        match self.reader.remaining() {
            Some(available) if available < needed => Err(DecodeError::Truncated {
                section,
                needed,
                available,
            }),
            _ => Ok(()),
        }
    }

    fn guard<T>(&mut self, res: Result<T, DecodeError>) -> Result<T, DecodeError> {
        if let Err(e) = &res {
            log::warn!("decode failed: {}", e);
            self.state = DecodeState::Failed;
        }
        res
    }
}

/// Header + metadata facts, without decoding the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub wave: WaveSummary,
    pub metadata_size: u32,
    pub reserved_metadata_len: usize,
    pub content_digest: String,
    pub payload_size: u32,
    pub chunk_count: u64,
    pub remainder_size: usize,
    pub expected_container_len: u64,
    pub input_len: Option<u64>,
}

/// 🔓 Decrypt a container with a caller-supplied AEAD.
///
/// File outputs appear only after the whole decode succeeded.
pub fn decrypt_container_with(
    input: InputSource,
    output: OutputSink,
    aead: Arc<dyn SectionAead>,
    config: &DecodeConfig,
) -> Result<TelemetrySnapshot, DecodeError> {
    let reader = open_input(input)?;
    let mut out = open_output(output)?;
    let mut driver = ContainerDriver::new(reader, aead, config.clone());

    if let Err(e) = driver.decode_into(out.writer()) {
        out.discard();
        return Err(e);
    }

    let buf = out.commit()?;
    let mut snapshot = driver.snapshot();
    if let Some(buf) = buf {
        snapshot.attach_output(buf);
    }
    Ok(snapshot)
}

/// 🔓 Decrypt a container with ChaCha20-Poly1305 under `key`.
pub fn decrypt_container(
    input: InputSource,
    output: OutputSink,
    key: &SongKey,
    config: &DecodeConfig,
) -> Result<TelemetrySnapshot, DecodeError> {
    decrypt_container_with(input, output, Arc::new(ChaChaAead::new(key)), config)
}

/// Path-to-path decode with the key fetched from `keys`.
pub fn decrypt_file(
    infile: &Path,
    outfile: &Path,
    keys: &dyn KeyStore,
    config: &DecodeConfig,
) -> Result<TelemetrySnapshot, DecodeError> {
    let key = keys.load_key()?;
    log::info!("decrypting {} -> {}", infile.display(), outfile.display());
    decrypt_container(
        InputSource::File(infile.to_path_buf()),
        OutputSink::File(outfile.to_path_buf()),
        &key,
        config,
    )
}

/// Authenticate header and metadata only and report what the payload stage would do.
pub fn inspect_container(
    input: InputSource,
    key: &SongKey,
    config: &DecodeConfig,
) -> Result<ContainerInfo, DecodeError> {
    let reader = open_input(input)?;
    let input_len = reader.total_len();
    let mut driver = ContainerDriver::new(reader, Arc::new(ChaChaAead::new(key)), config.clone());

    let header = driver.decode_header()?.clone();
    let metadata = driver.decode_metadata()?.clone();
    let plan = ChunkPlan::new(header.payload_size as u64);

    let expected_container_len = (SECTION_OVERHEAD + HEADER_PLAINTEXT_SIZE) as u64
        + (SECTION_OVERHEAD as u64 + header.metadata_size as u64)
        + plan.wire_len();

    Ok(ContainerInfo {
        wave: header.wave.summary(),
        metadata_size: header.metadata_size,
        reserved_metadata_len: metadata.reserved().len(),
        content_digest: metadata.content_digest().to_hex(),
        payload_size: header.payload_size,
        chunk_count: plan.chunk_count,
        remainder_size: plan.remainder_size,
        expected_container_len,
        input_len,
    })
}
