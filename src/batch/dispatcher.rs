//! Batch dispatcher
//!
//! The caller-side object tying an encoder, its flush policy, and a boundary
//! together. Calls go in through [`BatchDispatcher::call`]; whenever the
//! policy fires, the pending batch crosses the boundary in one go and the
//! buffer is reset for reuse.

use std::num::NonZeroUsize;

use tracing::{debug, warn};

use crate::boundary::Boundary;

use super::encoder::BatchEncoder;
use super::policy::FlushMode;
use super::slot::{FunctionRef, Slot};
use super::types::{BatchResult, DispatchStats};

/// Batches calls for a boundary and flushes them according to a policy
#[derive(Debug)]
pub struct BatchDispatcher<B: Boundary> {
    encoder: BatchEncoder,
    boundary: B,
    stats: DispatchStats,
}

impl<B: Boundary> BatchDispatcher<B> {
    /// Create a dispatcher around an existing encoder
    pub fn new(encoder: BatchEncoder, boundary: B) -> Self {
        Self {
            encoder,
            boundary,
            stats: DispatchStats::default(),
        }
    }

    /// Create a dispatcher with a fresh encoder sized for `args_per_call`
    pub fn with_settings(
        mode: FlushMode,
        batch_size: NonZeroUsize,
        args_per_call: usize,
        boundary: B,
    ) -> BatchResult<Self> {
        Ok(Self::new(BatchEncoder::new(mode, batch_size, args_per_call)?, boundary))
    }

    /// Queue one call, flushing if the policy says the batch is due
    #[inline]
    pub fn call(&mut self, function: FunctionRef, args: &[Slot]) -> BatchResult<()> {
        if self.encoder.append_call(function, args)? {
            self.flush()?;
        }
        Ok(())
    }

    /// Deliver the pending batch in one crossing. Does nothing when empty.
    pub fn flush(&mut self) -> BatchResult<()> {
        if !self.encoder.has_pending() {
            return Ok(());
        }

        let batch = self.encoder.pending_slots();
        let slots = batch.len();
        self.stats.peak_slots = self.stats.peak_slots.max(slots);

        let summary = self.boundary.execute_batch(batch)?;
        debug!(
            target: "callbatch::dispatch",
            flush = self.stats.flushes,
            entries = summary.entries,
            slots = summary.slots,
            boundary = self.boundary.name(),
            "flushed batch"
        );

        self.stats.flushes += 1;
        self.stats.slots_flushed += slots as u64;
        self.encoder.reset();
        Ok(())
    }

    /// Run a call whose result is needed now
    ///
    /// Pending calls are flushed first so the boundary observes them before
    /// this one, then the call crosses on its own through the direct path.
    pub fn call_immediate(&mut self, function: FunctionRef) -> BatchResult<()> {
        self.flush()?;
        self.boundary.call_direct(function)?;
        self.stats.immediate_calls += 1;
        Ok(())
    }

    /// Flush the trailing partial batch and return the run's totals
    pub fn finish(&mut self) -> BatchResult<DispatchStats> {
        self.flush()?;
        Ok(self.stats())
    }

    /// Totals so far. Only calls the encoder accepted are counted.
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            calls: self.encoder.calls_encoded(),
            capacity: self.encoder.buffer().capacity(),
            ..self.stats
        }
    }

    #[inline]
    pub fn pending_calls(&self) -> usize {
        self.encoder.pending_calls()
    }

    pub fn encoder(&self) -> &BatchEncoder {
        &self.encoder
    }

    pub fn boundary(&self) -> &B {
        &self.boundary
    }
}

impl<B: Boundary> Drop for BatchDispatcher<B> {
    fn drop(&mut self) {
        if self.encoder.has_pending() {
            warn!(
                target: "callbatch::dispatch",
                pending = self.encoder.pending_calls(),
                "dispatcher dropped with undelivered calls"
            );
        }
    }
}
