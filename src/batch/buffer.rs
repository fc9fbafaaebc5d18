//! Command buffer
//!
//! A growable, reusable linear sequence of slots. Logical length is tracked
//! separately from allocated capacity: `reset` drops the length to zero and
//! keeps the storage, so capacity acts as a high-water mark shared by every
//! batch of a run.

use tracing::trace;

use super::slot::Slot;
use super::types::{BatchError, BatchResult};

/// Reusable storage for encoded call entries
#[derive(Debug, Default)]
pub struct CommandBuffer {
    /// Encoded slots of the pending batch
    slots: Vec<Slot>,
    /// Largest logical length reached since creation
    high_water: usize,
}

impl CommandBuffer {
    /// Create an empty buffer without allocating
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with room for `capacity` slots
    ///
    /// The hint is reserved fallibly so an oversized run configuration
    /// surfaces as an error instead of aborting the process.
    pub fn with_capacity(capacity: usize) -> BatchResult<Self> {
        let mut buffer = Self::new();
        buffer.reserve(capacity)?;
        Ok(buffer)
    }

    /// Append opaque slots to the end of the buffer
    pub fn append_raw(&mut self, slots: &[Slot]) -> BatchResult<()> {
        self.reserve(slots.len())?;
        self.slots.extend_from_slice(slots);
        self.note_len();
        Ok(())
    }

    /// Append a header slot followed by its argument slots with one reservation
    pub(super) fn append_entry(&mut self, header: Slot, args: &[Slot]) -> BatchResult<()> {
        self.reserve(1 + args.len())?;
        self.slots.push(header);
        self.slots.extend_from_slice(args);
        self.note_len();
        Ok(())
    }

    /// Ensure room for `additional` more slots.
    ///
    /// Growth is geometric (delegated to `Vec`), so a caller that never
    /// flushes still appends in amortized constant time.
    pub fn reserve(&mut self, additional: usize) -> BatchResult<()> {
        let before = self.slots.capacity();
        self.slots
            .try_reserve(additional)
            .map_err(|source| BatchError::Allocation { requested: additional, source })?;
        if self.slots.capacity() != before {
            trace!(
                target: "callbatch::buffer",
                from = before,
                to = self.slots.capacity(),
                "grew command buffer"
            );
        }
        Ok(())
    }

    /// Current logical size in slots
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Allocated capacity in slots (informational)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Largest logical length reached since creation
    #[inline]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Read-only view of the pending batch
    #[inline]
    pub fn as_slice(&self) -> &[Slot] {
        &self.slots
    }

    /// Set the logical length to zero. Never reallocates.
    #[inline]
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    #[inline]
    fn note_len(&mut self) {
        if self.slots.len() > self.high_water {
            self.high_water = self.slots.len();
        }
    }
}
