//! Batch encoder
//!
//! Appends call entries to a [`CommandBuffer`] and consults the
//! [`FlushPolicy`] after each one. The encoder never reorders entries and
//! never inspects argument values.
//!
//! Calls whose result must be observed immediately (directly or through an
//! out-argument) must not go through the encoder: flush the pending batch
//! first and make them through the direct path instead. The encoder cannot
//! tell such calls apart; see [`BatchDispatcher::call_immediate`](super::BatchDispatcher::call_immediate).

use std::num::NonZeroUsize;

use tracing::trace;

use super::buffer::CommandBuffer;
use super::policy::{FlushMode, FlushPolicy};
use super::slot::{EntryHeader, FunctionRef, Slot};
use super::types::{BatchError, BatchResult};

/// Encodes calls into a reusable command buffer
#[derive(Debug)]
pub struct BatchEncoder {
    buffer: CommandBuffer,
    policy: FlushPolicy,
    /// Calls appended since the last reset
    pending_calls: usize,
    /// Calls appended since creation
    calls_encoded: u64,
}

impl BatchEncoder {
    /// Create an encoder whose buffer is sized for one full batch of
    /// `args_per_call`-argument calls
    pub fn new(mode: FlushMode, batch_size: NonZeroUsize, args_per_call: usize) -> BatchResult<Self> {
        let hint = batch_size.get().saturating_mul(1 + args_per_call);
        Ok(Self::with_buffer(
            CommandBuffer::with_capacity(hint)?,
            FlushPolicy::new(mode, batch_size),
        ))
    }

    /// Create an encoder around an existing buffer. The buffer is reset.
    pub fn with_buffer(mut buffer: CommandBuffer, policy: FlushPolicy) -> Self {
        buffer.reset();
        Self {
            buffer,
            policy,
            pending_calls: 0,
            calls_encoded: 0,
        }
    }

    /// Append one call entry and report whether the batch should be flushed now
    ///
    /// Layout: one header slot (function + argument count), then `args` in order.
    pub fn append_call(&mut self, function: FunctionRef, args: &[Slot]) -> BatchResult<bool> {
        let arg_count =
            u32::try_from(args.len()).map_err(|_| BatchError::TooManyArgs { got: args.len() })?;
        let header = EntryHeader::new(function, arg_count);

        self.buffer.append_entry(header.encode(), args)?;

        let call_index = self.calls_encoded;
        self.pending_calls += 1;
        self.calls_encoded += 1;

        trace!(
            target: "callbatch::encoder",
            call = call_index,
            function = %function,
            arg_count,
            pending = self.pending_calls,
            "encoded call"
        );

        Ok(self.policy.should_flush(self.pending_calls, call_index))
    }

    /// Encoded slots of the pending batch
    #[inline]
    pub fn pending_slots(&self) -> &[Slot] {
        self.buffer.as_slice()
    }

    /// Number of calls waiting to be flushed
    #[inline]
    pub fn pending_calls(&self) -> usize {
        self.pending_calls
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending_calls > 0
    }

    /// Calls appended since creation
    #[inline]
    pub fn calls_encoded(&self) -> u64 {
        self.calls_encoded
    }

    #[inline]
    pub fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }

    /// Forget the pending batch after it has been delivered. Capacity is kept.
    #[inline]
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.pending_calls = 0;
    }
}
