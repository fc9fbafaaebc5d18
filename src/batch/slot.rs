//! Slot and entry header encoding
//!
//! The command stream is a flat sequence of fixed-width 64-bit slots. Every
//! call entry opens with a single header slot followed by its argument slots:
//!
//! ```text
//! ┌───────────────────────────┬───────────────────────────┐
//! │ function_ref (bits 63..32)│ arg_count (bits 31..0)    │  header
//! ├───────────────────────────┴───────────────────────────┤
//! │ arg 0                                                 │
//! │ ...                                                   │
//! │ arg (arg_count - 1)                                   │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! A call with `k` arguments therefore occupies exactly `1 + k` slots.

/// One fixed-width, untyped unit of the command stream
pub type Slot = u64;

/// Mask selecting the argument count from a header slot
pub const ARG_COUNT_MASK: u64 = 0x0000_0000_FFFF_FFFF;

/// Bit offset of the function reference inside a header slot
pub const FUNCTION_SHIFT: u32 = 32;

/// Stable index of a boundary-side function
///
/// Indices are assigned sequentially by [`FunctionTable`](crate::boundary::FunctionTable)
/// at registration time and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FunctionRef(pub u32);

impl FunctionRef {
    /// Placeholder reference used by the benchmark (the no-op function)
    pub const NOOP: FunctionRef = FunctionRef(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn#{}", self.0)
    }
}

/// Decoded form of a header slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    pub function: FunctionRef,
    pub arg_count: u32,
}

impl EntryHeader {
    #[inline]
    pub fn new(function: FunctionRef, arg_count: u32) -> Self {
        Self { function, arg_count }
    }

    /// Pack the header into a single slot
    #[inline]
    pub fn encode(self) -> Slot {
        ((self.function.0 as u64) << FUNCTION_SHIFT) | (self.arg_count as u64)
    }

    /// Unpack a header slot. Every bit pattern is a valid header; whether the
    /// argument count fits the batch is checked by the executor.
    #[inline]
    pub fn decode(slot: Slot) -> Self {
        Self {
            function: FunctionRef((slot >> FUNCTION_SHIFT) as u32),
            arg_count: (slot & ARG_COUNT_MASK) as u32,
        }
    }

    /// Slots occupied by the whole entry, header included
    #[inline]
    pub fn entry_len(self) -> usize {
        1 + self.arg_count as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_packs_both_fields() {
        let header = EntryHeader::new(FunctionRef(7), 5);
        assert_eq!(header.encode(), (7u64 << 32) | 5);
        assert_eq!(EntryHeader::decode(header.encode()), header);
    }

    #[test]
    fn test_header_extremes() {
        let header = EntryHeader::new(FunctionRef(u32::MAX), u32::MAX);
        assert_eq!(header.encode(), u64::MAX);
        assert_eq!(EntryHeader::decode(u64::MAX), header);

        let zero = EntryHeader::decode(0);
        assert_eq!(zero.function, FunctionRef::NOOP);
        assert_eq!(zero.arg_count, 0);
        assert_eq!(zero.entry_len(), 1);
    }

    #[test]
    fn test_entry_len_counts_header() {
        for k in [0u32, 1, 5, 64] {
            assert_eq!(EntryHeader::new(FunctionRef(3), k).entry_len(), 1 + k as usize);
        }
    }

    #[test]
    fn test_function_ref_display() {
        assert_eq!(FunctionRef(12).to_string(), "fn#12");
    }
}
