//! Boundary executor
//!
//! Runs on the far side of a boundary crossing. Given a batch (slots plus
//! length) it walks the entries from offset 0, invoking the referenced
//! function once per entry and stepping over argument slots without decoding
//! them:
//!
//! ```text
//! cursor = 0
//! while cursor < len:
//!     header = slots[cursor]                      decode
//!     invoke(header.function, next arg_count)     invoke
//!     cursor += 1 + header.arg_count
//! ```
//!
//! A batch either executes completely or not at all. The layout and every
//! function reference are checked before the first invocation, so a corrupt
//! header never leaves a half-delivered batch behind.

use tracing::trace;

use super::slot::{EntryHeader, FunctionRef, Slot};
use super::types::{BatchError, BatchResult, ExecSummary};

/// One decoded call entry, borrowing its argument slots from the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEntry<'a> {
    /// Slot offset of the entry's header within the batch
    pub offset: usize,
    pub function: FunctionRef,
    /// Argument slots, passed through untouched
    pub args: &'a [Slot],
}

/// Sequential decoder over a batch
///
/// Yields one entry per header; stops after the first error.
#[derive(Debug, Clone)]
pub struct EntryCursor<'a> {
    slots: &'a [Slot],
    pos: usize,
    failed: bool,
}

impl<'a> EntryCursor<'a> {
    pub fn new(slots: &'a [Slot]) -> Self {
        Self { slots, pos: 0, failed: false }
    }

    /// Current read position in slots
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for EntryCursor<'a> {
    type Item = BatchResult<CallEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.slots.len() {
            return None;
        }

        let offset = self.pos;
        let header = EntryHeader::decode(self.slots[offset]);
        let args_start = offset + 1;
        let remaining = self.slots.len() - args_start;
        let arg_count = header.arg_count as usize;

        if arg_count > remaining {
            self.failed = true;
            return Some(Err(BatchError::Corrupted {
                offset,
                arg_count,
                len: self.slots.len(),
            }));
        }

        self.pos = args_start + arg_count;
        Some(Ok(CallEntry {
            offset,
            function: header.function,
            args: &self.slots[args_start..self.pos],
        }))
    }
}

/// Receiver of decoded calls on the boundary side
pub trait CallSink {
    /// Whether `function` can be invoked
    fn knows(&self, function: FunctionRef) -> bool;

    /// Invoke one decoded entry. Only called for functions `knows` accepted.
    fn invoke(&mut self, entry: CallEntry<'_>);
}

/// Decodes a batch and dispatches every entry to a [`CallSink`]
#[derive(Debug, Default)]
pub struct BoundaryExecutor {
    batches: u64,
}

impl BoundaryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches executed successfully
    #[inline]
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Execute the first `len` slots of `slots` as one batch
    ///
    /// Fails with `Corrupted` if `len` exceeds the slots available or a header
    /// overruns the batch, and with `UnknownFunction` if the sink rejects a
    /// reference. In both cases nothing has been invoked.
    pub fn execute<S: CallSink>(&mut self, slots: &[Slot], len: usize, sink: &mut S) -> BatchResult<ExecSummary> {
        if len > slots.len() {
            return Err(BatchError::Corrupted { offset: 0, arg_count: 0, len: slots.len() });
        }
        let batch = &slots[..len];

        Self::validate(batch, sink)?;

        let mut summary = ExecSummary::default();
        for entry in EntryCursor::new(batch) {
            // Layout was validated above; decoding cannot fail here.
            let Ok(entry) = entry else { break };
            trace!(
                target: "callbatch::executor",
                offset = entry.offset,
                function = %entry.function,
                args = entry.args.len(),
                "invoke"
            );
            sink.invoke(entry);
            summary.entries += 1;
        }
        summary.slots = batch.len();

        self.batches += 1;
        Ok(summary)
    }

    fn validate<S: CallSink>(batch: &[Slot], sink: &S) -> BatchResult<()> {
        for entry in EntryCursor::new(batch) {
            let entry = entry?;
            if !sink.knows(entry.function) {
                return Err(BatchError::UnknownFunction(entry.function));
            }
        }
        Ok(())
    }
}
