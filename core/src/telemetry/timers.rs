// ## src/telemetry/timers.rs

//! Wall-clock accounting for a decode pass, split by the stage that spent it.

use std::fmt;
use std::time::{Duration, Instant};
use serde::Serialize;

/// Where decode time goes. Chunk decryption on worker threads is charged to
/// `Decrypt` as the sum of per-chunk times, so stage totals can exceed the
/// wall clock in parallel runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    /// Pulling sealed sections off the input.
    Read,
    /// AEAD verification and decryption.
    Decrypt,
    /// Handing plaintext to the output sink.
    Write,
    /// Post-decode checks such as the payload-length comparison.
    Validate,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Read, Stage::Decrypt, Stage::Write, Stage::Validate];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Read => "read",
            Stage::Decrypt => "decrypt",
            Stage::Write => "write",
            Stage::Validate => "validate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accumulated time per stage. Serializes as one field per stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageTimes {
    pub read: Duration,
    pub decrypt: Duration,
    pub write: Duration,
    pub validate: Duration,
}

impl StageTimes {
    fn slot(&mut self, stage: Stage) -> &mut Duration {
        match stage {
            Stage::Read => &mut self.read,
            Stage::Decrypt => &mut self.decrypt,
            Stage::Write => &mut self.write,
            Stage::Validate => &mut self.validate,
        }
    }

    pub fn add(&mut self, stage: Stage, dur: Duration) {
        *self.slot(stage) += dur;
    }

    pub fn get(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Read => self.read,
            Stage::Decrypt => self.decrypt,
            Stage::Write => self.write,
            Stage::Validate => self.validate,
        }
    }

    pub fn get_ms(&self, stage: Stage) -> f64 {
        self.get(stage).as_secs_f64() * 1_000.0
    }

    pub fn total(&self) -> Duration {
        self.iter().map(|(_, d)| d).sum()
    }

    /// Stages in pipeline order with their accumulated time.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, Duration)> + '_ {
        Stage::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

/// Wall clock for one decode plus the per-stage breakdown.
#[derive(Clone, Debug)]
pub struct TelemetryTimer {
    started: Instant,
    finished: Option<Instant>,
    stages: StageTimes,
}

impl Default for TelemetryTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryTimer {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            finished: None,
            stages: StageTimes::default(),
        }
    }

    /// Freeze the wall clock. Later stage charges are still recorded.
    pub fn finish(&mut self) {
        self.finished.get_or_insert_with(Instant::now);
    }

    pub fn add_stage_time(&mut self, stage: Stage, dur: Duration) {
        self.stages.add(stage, dur);
    }

    /// Run `f` and charge its wall time to `stage`.
    pub fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let t = Instant::now();
        let out = f();
        self.stages.add(stage, t.elapsed());
        out
    }

    pub fn stages(&self) -> &StageTimes {
        &self.stages
    }

    pub fn elapsed(&self) -> Duration {
        self.finished
            .unwrap_or_else(Instant::now)
            .duration_since(self.started)
    }
}
