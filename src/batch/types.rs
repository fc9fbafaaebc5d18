//! Type definitions shared by the batching core.
//!
//! This module contains:
//! - BatchError: Errors raised while encoding, flushing, or decoding a batch
//! - ExecSummary: What a single flush delivered to the boundary side
//! - DispatchStats: Totals reported by a dispatcher at the end of a run

use std::collections::TryReserveError;

use super::slot::FunctionRef;

/// Result of a batching operation
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that can occur while batching boundary calls
///
/// Every variant is fatal for the run: the command stream is produced and
/// consumed by the same process, so a decoding failure signals a bug.
#[derive(Debug, Clone)]
pub enum BatchError {
    /// The command buffer could not grow by the requested number of slots
    Allocation { requested: usize, source: TryReserveError },
    /// A call carried more arguments than a header can describe
    TooManyArgs { got: usize },
    /// A header's argument count runs past the end of the batch
    Corrupted { offset: usize, arg_count: usize, len: usize },
    /// A header referenced a function the boundary side does not know
    UnknownFunction(FunctionRef),
    /// The boundary entry point received a null batch or table pointer
    NullPointer,
    /// The boundary thread is no longer answering
    Disconnected,
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allocation { requested, source } => {
                write!(f, "Command buffer allocation failed for {} slots: {}", requested, source)
            }
            Self::TooManyArgs { got } => {
                write!(f, "Too many arguments for one call: {} (max {})", got, u32::MAX)
            }
            Self::Corrupted { offset, arg_count, len } => write!(
                f,
                "Corrupted batch: entry at slot {} declares {} arguments but the batch holds {} slots",
                offset, arg_count, len
            ),
            Self::UnknownFunction(func) => write!(f, "Unknown boundary function: {}", func),
            Self::NullPointer => write!(f, "Null pointer passed across the boundary"),
            Self::Disconnected => write!(f, "Boundary thread disconnected"),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Allocation { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Outcome of executing one batch on the boundary side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecSummary {
    /// Number of call entries decoded and invoked
    pub entries: usize,
    /// Number of slots consumed, headers included
    pub slots: usize,
}

/// Totals collected by a dispatcher over its lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Logical calls successfully encoded
    pub calls: u64,
    /// Calls delivered through the direct path by `call_immediate`
    pub immediate_calls: u64,
    /// Boundary crossings made to deliver batches
    pub flushes: u64,
    /// Slots handed to the boundary across all flushes
    pub slots_flushed: u64,
    /// Largest batch, in slots, held before a flush
    pub peak_slots: usize,
    /// Command buffer capacity at the end of the run
    pub capacity: usize,
}
