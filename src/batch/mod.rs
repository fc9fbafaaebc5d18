//! Call batching core
//!
//! Packs many logical boundary calls into one encoded command stream so they
//! can be delivered with a single crossing.
//!
//! This module is organized into submodules by component:
//! - `slot`: Slot width and the packed entry header
//! - `buffer`: Reusable command buffer
//! - `encoder`: Appends call entries and consults the flush policy
//! - `policy`: Call-count flush decision
//! - `executor`: Boundary-side decode and dispatch loop
//! - `dispatcher`: Caller-side glue between encoder and boundary
//! - `types`: Errors and statistics

mod buffer;
mod dispatcher;
mod encoder;
mod executor;
mod policy;
mod slot;
mod types;

#[cfg(test)]
mod tests;

// === Re-exports ===

pub use buffer::CommandBuffer;
pub use dispatcher::BatchDispatcher;
pub use encoder::BatchEncoder;
pub use executor::{BoundaryExecutor, CallEntry, CallSink, EntryCursor};
pub use policy::{FlushMode, FlushPolicy};
pub use slot::{EntryHeader, FunctionRef, Slot, ARG_COUNT_MASK, FUNCTION_SHIFT};
pub use types::{BatchError, BatchResult, DispatchStats, ExecSummary};
