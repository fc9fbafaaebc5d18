//! In-process boundary that records every call it runs.
//!
//! Decodes batches with the same [`BoundaryExecutor`] the C ABI uses, so what
//! it records is exactly what a native boundary would have invoked.

use smallvec::SmallVec;

use crate::batch::{
    BatchResult, BoundaryExecutor, CallEntry, CallSink, ExecSummary, FunctionRef, Slot,
};

use super::Boundary;

/// One call observed by a [`RecordingBoundary`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub function: FunctionRef,
    pub args: SmallVec<[Slot; 8]>,
    /// Index of the flush that delivered the call, `None` for direct calls
    pub flush: Option<usize>,
}

#[derive(Debug, Default)]
struct Recorder {
    /// Functions with an index below this are known; `None` knows everything
    known: Option<u32>,
    current_flush: Option<usize>,
    calls: Vec<RecordedCall>,
}

impl CallSink for Recorder {
    fn knows(&self, function: FunctionRef) -> bool {
        self.known.map_or(true, |limit| function.0 < limit)
    }

    fn invoke(&mut self, entry: CallEntry<'_>) {
        self.calls.push(RecordedCall {
            function: entry.function,
            args: SmallVec::from_slice(entry.args),
            flush: self.current_flush,
        });
    }
}

/// Boundary that records calls, argument slots, and flush sizes
#[derive(Debug, Default)]
pub struct RecordingBoundary {
    executor: BoundaryExecutor,
    recorder: Recorder,
    flushes: Vec<ExecSummary>,
    direct_calls: usize,
}

impl RecordingBoundary {
    /// A boundary that accepts any function reference
    pub fn new() -> Self {
        Self::default()
    }

    /// A boundary that only knows the first `count` functions
    pub fn with_known_functions(count: u32) -> Self {
        let mut boundary = Self::new();
        boundary.recorder.known = Some(count);
        boundary
    }

    /// Every call invoked, in invocation order
    pub fn calls(&self) -> &[RecordedCall] {
        &self.recorder.calls
    }

    /// One summary per successful batch crossing, in order
    pub fn flushes(&self) -> &[ExecSummary] {
        &self.flushes
    }

    /// Number of direct-path crossings
    pub fn direct_calls(&self) -> usize {
        self.direct_calls
    }

    /// Total boundary crossings, direct and batched
    pub fn crossings(&self) -> usize {
        self.direct_calls + self.flushes.len()
    }

    /// Total slots decoded across all flushes
    pub fn slots_decoded(&self) -> usize {
        self.flushes.iter().map(|f| f.slots).sum()
    }
}

impl Boundary for RecordingBoundary {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn call_direct(&mut self, function: FunctionRef) -> BatchResult<()> {
        if !self.recorder.knows(function) {
            return Err(crate::batch::BatchError::UnknownFunction(function));
        }
        self.direct_calls += 1;
        self.recorder.calls.push(RecordedCall {
            function,
            args: SmallVec::new(),
            flush: None,
        });
        Ok(())
    }

    fn execute_batch(&mut self, batch: &[Slot]) -> BatchResult<ExecSummary> {
        self.recorder.current_flush = Some(self.flushes.len());
        let result = self.executor.execute(batch, batch.len(), &mut self.recorder);
        self.recorder.current_flush = None;

        let summary = result?;
        self.flushes.push(summary);
        Ok(summary)
    }
}
