//! The far side of a boundary crossing
//!
//! A [`Boundary`] is anything a caller crosses into: it can run one call per
//! crossing (the direct path) or a whole encoded batch per crossing. The cost
//! the batching core amortizes is the fixed part of each crossing.
//!
//! This module provides:
//! - `registry`: the table of boundary-side functions, indexed by `FunctionRef`
//! - `ffi`: the C ABI entry points (`callbatch_invoke`, `callbatch_drain`)
//! - `native`: crossings through the C ABI on the caller's thread
//! - `thread`: crossings as blocking round trips to a dedicated boundary thread
//! - `recording`: an in-process boundary that records what it was asked to run

use serde::Deserialize;

use crate::batch::{BatchResult, ExecSummary, FunctionRef, Slot};

pub mod ffi;
mod native;
mod recording;
mod registry;
mod thread;

pub use native::NativeBoundary;
pub use recording::{RecordedCall, RecordingBoundary};
pub use registry::{callbatch_noop, BoundaryFn, FunctionTable};
pub use thread::ThreadBoundary;

/// Something a caller crosses into
///
/// Both operations block until the boundary side has finished.
pub trait Boundary {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// Direct path: cross once to run a single call
    fn call_direct(&mut self, function: FunctionRef) -> BatchResult<()>;

    /// Batched path: cross once to decode and run every entry of `batch`
    fn execute_batch(&mut self, batch: &[Slot]) -> BatchResult<ExecSummary>;
}

impl<B: Boundary + ?Sized> Boundary for &mut B {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn call_direct(&mut self, function: FunctionRef) -> BatchResult<()> {
        (**self).call_direct(function)
    }

    fn execute_batch(&mut self, batch: &[Slot]) -> BatchResult<ExecSummary> {
        (**self).execute_batch(batch)
    }
}

/// Which boundary a run crosses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    /// C ABI calls on the caller's thread. A crossing costs little more
    /// than a function call, so batching rarely pays off here.
    Native,
    /// Round trips to a dedicated boundary thread
    #[default]
    Thread,
}

impl BoundaryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Thread => "thread",
        }
    }
}

impl std::fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BoundaryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Self::Native),
            "thread" => Ok(Self::Thread),
            other => Err(format!("unknown boundary '{}' (expected native or thread)", other)),
        }
    }
}
