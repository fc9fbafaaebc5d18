//! Benchmark harness
//!
//! Times the two strategies over the same number of logical calls:
//!
//! 1. **Direct**: one boundary crossing per call.
//! 2. **Batched**: calls are encoded with `arg_count` argument slots each and
//!    delivered `batch_size` at a time, then the trailing partial batch is
//!    flushed.
//!
//! Every call targets [`FunctionRef::NOOP`], so what is measured is the
//! crossing and encoding overhead alone.

use std::hint::black_box;
use std::time::{Duration, Instant};

use smallvec::{smallvec, SmallVec};
use tracing::info;

use crate::batch::{BatchDispatcher, BatchError, DispatchStats, FunctionRef, Slot};
use crate::boundary::{Boundary, BoundaryKind, FunctionTable, NativeBoundary, ThreadBoundary};
use crate::config::{ConfigError, RunConfig, RunSettings};

/// Errors that end a run, tagged with the stage that failed
#[derive(Debug)]
pub enum RunError {
    /// The configuration was rejected before any call was made
    Config(ConfigError),
    /// The boundary could not be brought up
    Boundary(std::io::Error),
    /// A direct-path crossing failed
    Direct(BatchError),
    /// Encoding or flushing a batch failed
    Batched(BatchError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {}", e),
            Self::Boundary(e) => write!(f, "boundary setup: {}", e),
            Self::Direct(e) => write!(f, "direct calls: {}", e),
            Self::Batched(e) => write!(f, "batched calls: {}", e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Boundary(e) => Some(e),
            Self::Direct(e) | Self::Batched(e) => Some(e),
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Measurements of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub settings: RunSettings,
    /// Boundary the calls crossed
    pub boundary: &'static str,
    /// Elapsed time of the direct path
    pub direct: Duration,
    /// Elapsed time of the batched path, encoding included
    pub batched: Duration,
    /// Batching totals
    pub stats: DispatchStats,
}

impl RunReport {
    pub fn direct_per_call(&self) -> Duration {
        per_call(self.direct, self.settings.call_count.get())
    }

    pub fn batched_per_call(&self) -> Duration {
        per_call(self.batched, self.settings.call_count.get())
    }

    /// Direct time divided by batched time
    pub fn speedup(&self) -> f64 {
        let batched = self.batched.as_secs_f64();
        if batched == 0.0 {
            return f64::INFINITY;
        }
        self.direct.as_secs_f64() / batched
    }

    /// `bs | calls | args | direct | batched`, for pasting into a Markdown table
    pub fn markdown_row(&self) -> String {
        format!(
            "{} | {} | {} | {:?} | {:?}",
            self.settings.batch_size,
            self.settings.call_count,
            self.settings.arg_count,
            self.direct,
            self.batched
        )
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Benchmarking:")?;
        writeln!(f, "\tBoundary: {}", self.boundary)?;
        writeln!(f, "\tBatch Size: {}", self.settings.batch_size)?;
        writeln!(f, "\tNumber Of Calls: {}", self.settings.call_count)?;
        writeln!(f, "\tNumber Of Args: {}", self.settings.arg_count)?;
        writeln!(f, "\tFlush Mode: {}", self.settings.flush_mode)?;
        writeln!(f)?;
        writeln!(f, "Direct {:?} ({:?}/call)", self.direct, self.direct_per_call())?;
        writeln!(f, "Batching {:?} ({:?}/call)", self.batched, self.batched_per_call())?;
        writeln!(
            f,
            "Flushes {} ({} slots, peak {} slots, capacity {})",
            self.stats.flushes, self.stats.slots_flushed, self.stats.peak_slots, self.stats.capacity
        )?;
        writeln!(f, "Speedup {:.2}x", self.speedup())?;
        writeln!(f)?;
        write!(f, "{}", self.markdown_row())
    }
}

fn per_call(total: Duration, calls: u64) -> Duration {
    let nanos = total.as_nanos() / u128::from(calls.max(1));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Validate `config`, bring up its boundary, and time both strategies
pub fn run(config: &RunConfig) -> Result<RunReport, RunError> {
    let settings = config.validate()?;
    match settings.boundary {
        BoundaryKind::Native => run_with(&settings, &mut NativeBoundary::default()),
        BoundaryKind::Thread => {
            let mut boundary =
                ThreadBoundary::spawn(FunctionTable::with_noop()).map_err(RunError::Boundary)?;
            run_with(&settings, &mut boundary)
        }
    }
}

/// Time both strategies against an existing boundary
pub fn run_with<B: Boundary>(settings: &RunSettings, boundary: &mut B) -> Result<RunReport, RunError> {
    info!(
        target: "callbatch::harness",
        boundary = boundary.name(),
        batch_size = settings.batch_size.get(),
        arg_count = settings.arg_count,
        call_count = settings.call_count.get(),
        flush_mode = %settings.flush_mode,
        "starting run"
    );

    let direct = run_direct(settings, &mut *boundary).map_err(RunError::Direct)?;
    info!(target: "callbatch::harness", elapsed = ?direct, "direct path done");

    let (batched, stats) = run_batched(settings, &mut *boundary).map_err(RunError::Batched)?;
    info!(target: "callbatch::harness", elapsed = ?batched, flushes = stats.flushes, "batched path done");

    Ok(RunReport {
        settings: *settings,
        boundary: boundary.name(),
        direct,
        batched,
        stats,
    })
}

/// One crossing per call
pub fn run_direct<B: Boundary>(settings: &RunSettings, boundary: &mut B) -> Result<Duration, BatchError> {
    let calls = settings.call_count.get();
    let start = Instant::now();
    for _ in 0..calls {
        boundary.call_direct(black_box(FunctionRef::NOOP))?;
    }
    Ok(start.elapsed())
}

/// `batch_size` calls per crossing, trailing partial batch included
pub fn run_batched<B: Boundary>(
    settings: &RunSettings,
    boundary: &mut B,
) -> Result<(Duration, DispatchStats), BatchError> {
    // Buffer setup is not part of the measurement
    let mut dispatcher = BatchDispatcher::with_settings(
        settings.flush_mode,
        settings.batch_size,
        settings.arg_count,
        boundary,
    )?;
    let mut args: SmallVec<[Slot; 8]> = smallvec![0; settings.arg_count];

    let calls = settings.call_count.get();
    let start = Instant::now();
    for i in 0..calls {
        // Placeholder arguments: the call index in every slot
        args.fill(i);
        dispatcher.call(FunctionRef::NOOP, black_box(&args))?;
    }
    let stats = dispatcher.finish()?;
    Ok((start.elapsed(), stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FlushMode;
    use crate::boundary::RecordingBoundary;

    fn settings(batch_size: usize, arg_count: usize, call_count: u64, flush_mode: FlushMode) -> RunSettings {
        RunConfig {
            batch_size,
            arg_count,
            call_count,
            flush_mode,
            boundary: BoundaryKind::Native,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_run_with_recording_boundary() {
        let s = settings(2, 1, 5, FlushMode::Threshold);
        let mut boundary = RecordingBoundary::new();
        let report = run_with(&s, &mut boundary).unwrap();

        assert_eq!(report.boundary, "recording");
        assert_eq!(report.stats.calls, 5);
        assert_eq!(report.stats.flushes, 3);
        assert_eq!(report.stats.slots_flushed, 10);

        // 5 direct calls, then 5 batched calls carrying their index as argument
        assert_eq!(boundary.direct_calls(), 5);
        let batched_args: Vec<Slot> = boundary.calls()[5..].iter().map(|c| c.args[0]).collect();
        assert_eq!(batched_args, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_every_arg_slot_carries_call_index() {
        let s = settings(3, 4, 6, FlushMode::Modulo);
        let mut boundary = RecordingBoundary::new();
        run_batched(&s, &mut boundary).unwrap();

        for (i, call) in boundary.calls().iter().enumerate() {
            assert_eq!(call.args.as_slice(), &[i as Slot; 4]);
        }
    }

    #[test]
    fn test_run_native_boundary() {
        let config = RunConfig {
            call_count: 1_000,
            boundary: BoundaryKind::Native,
            ..RunConfig::default()
        };
        let report = run(&config).unwrap();
        assert_eq!(report.boundary, "native");
        assert_eq!(report.stats.calls, 1_000);
        assert_eq!(report.stats.flushes, 40);
        assert_eq!(report.stats.slots_flushed, 6_000);
    }

    #[test]
    fn test_run_defaults_cross_thread_boundary() {
        let config = RunConfig { call_count: 500, ..RunConfig::default() };
        let report = run(&config).unwrap();
        assert_eq!(report.boundary, "thread");
        assert_eq!(report.stats.flushes, 20);
    }

    #[test]
    fn test_invalid_config_fails_before_any_call() {
        let config = RunConfig { batch_size: 0, ..RunConfig::default() };
        let err = run(&config).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::InvalidBatchSize(0))));
        assert!(err.to_string().starts_with("configuration:"));
    }

    #[test]
    fn test_report_formatting() {
        let report = RunReport {
            settings: settings(25, 5, 350_000, FlushMode::Threshold),
            boundary: "native",
            direct: Duration::from_millis(700),
            batched: Duration::from_millis(350),
            stats: DispatchStats::default(),
        };
        assert_eq!(report.markdown_row(), "25 | 350000 | 5 | 700ms | 350ms");
        assert_eq!(report.direct_per_call(), Duration::from_nanos(2_000));
        assert!((report.speedup() - 2.0).abs() < 1e-9);

        let text = report.to_string();
        assert!(text.contains("Batch Size: 25"));
        assert!(text.ends_with("25 | 350000 | 5 | 700ms | 350ms"));
    }
}
