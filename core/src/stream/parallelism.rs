use crate::constants::{INFLIGHT_MEM_FRACTION, MAX_INFLIGHT_CHUNKS};

/// Parallelism configuration for the chunk stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelismProfile {
    pub worker_count: usize,
    /// Capacity of each pipeline channel.
    pub inflight_chunks: usize,
}

impl ParallelismProfile {
    pub fn single_threaded() -> Self {
        Self {
            worker_count: 1,
            inflight_chunks: 1,
        }
    }

    /// Fixed worker count; in-flight capacity scales with it.
    pub fn with_workers(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        Self {
            worker_count,
            inflight_chunks: (worker_count * 4).min(MAX_INFLIGHT_CHUNKS),
        }
    }

    /// Size the pool from the host: one worker per core but one, and as many
    /// in-flight chunks as `mem_fraction` of available memory allows, capped.
    pub fn dynamic(chunk_wire_len: u64, mem_fraction: f64, hard_cap: usize) -> Self {
        let cores = num_cpus::get();
        let worker_count = cores.saturating_sub(1).max(1);

        let mut sys = sysinfo::System::new();
        sys.refresh_memory();
        let avail_bytes = sys.available_memory();
        let budget = (avail_bytes as f64 * mem_fraction) as u64;

        // Every in-flight chunk is held twice at most: sealed and opened.
        let per_chunk = chunk_wire_len.max(1) * 2;
        let max_chunks = (budget / per_chunk).max(1);

        let inflight_chunks = max_chunks.min(hard_cap.max(1) as u64) as usize;

        log::debug!(
            "parallelism: workers={} inflight_chunks={} avail_mem={}",
            worker_count,
            inflight_chunks,
            avail_bytes
        );

        Self {
            worker_count,
            inflight_chunks,
        }
    }

    pub fn auto(chunk_wire_len: u64) -> Self {
        Self::dynamic(chunk_wire_len, INFLIGHT_MEM_FRACTION, MAX_INFLIGHT_CHUNKS)
    }

    /// Most sections that may be read but not yet written at any time: one
    /// per channel slot plus one per worker. Bounds the reorder buffer.
    pub fn reorder_window(&self) -> usize {
        self.inflight_chunks.max(1) + self.worker_count.max(1)
    }

    pub fn is_serial(&self) -> bool {
        self.worker_count <= 1
    }
}
