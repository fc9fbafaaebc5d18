//! Flush policy
//!
//! Decides, after each appended call, whether the pending batch must be
//! handed to the boundary now. The decision counts calls, not slots: a call
//! with many arguments weighs the same as a call with none.

use std::num::NonZeroUsize;

use serde::Deserialize;

/// When a pending batch is flushed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushMode {
    /// Flush once `batch_size` calls are pending
    #[default]
    Threshold,
    /// Flush whenever the zero-based index of the call just appended is a
    /// multiple of `batch_size`. The first call flushes a one-call batch and
    /// later batches hold `batch_size` calls. Results stay comparable with
    /// runs made under this trigger.
    Modulo,
}

impl FlushMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::Modulo => "modulo",
        }
    }
}

impl std::fmt::Display for FlushMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlushMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "threshold" => Ok(Self::Threshold),
            "modulo" => Ok(Self::Modulo),
            other => Err(format!("unknown flush mode '{}' (expected threshold or modulo)", other)),
        }
    }
}

/// Flush decision for a fixed batch size
///
/// Pure: the answer depends only on the counters passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPolicy {
    mode: FlushMode,
    batch_size: NonZeroUsize,
}

impl FlushPolicy {
    pub fn new(mode: FlushMode, batch_size: NonZeroUsize) -> Self {
        Self { mode, batch_size }
    }

    #[inline]
    pub fn mode(&self) -> FlushMode {
        self.mode
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// Should the batch be flushed after the call just appended?
    ///
    /// * `pending_count` - calls appended since the last flush, including it
    /// * `call_index` - zero-based index of that call within the run
    #[inline]
    pub fn should_flush(&self, pending_count: usize, call_index: u64) -> bool {
        match self.mode {
            FlushMode::Threshold => pending_count >= self.batch_size.get(),
            FlushMode::Modulo => call_index % self.batch_size.get() as u64 == 0,
        }
    }
}
