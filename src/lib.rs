//! callbatch - Boundary Call Batching
//!
//! Crossing a runtime boundary (a C ABI, a thread hop, a sandbox edge) has a
//! fixed cost per crossing. This library amortizes that cost by packing many
//! logical calls into one encoded command stream and delivering the whole
//! stream with a single crossing.
//!
//! # Architecture
//!
//! 1. **Encoding** (`batch` module)
//!    - Each call becomes one header slot (function reference + argument count)
//!      followed by its argument slots
//!    - Entries accumulate in a reusable command buffer whose capacity is kept
//!      across flushes
//!    - A call-count flush policy decides when the pending batch crosses
//!
//! 2. **Execution** (`boundary` module)
//!    - The boundary side walks the batch, invoking each referenced function
//!      and stepping over argument slots
//!    - C ABI entry points (`callbatch_invoke`, `callbatch_drain`) make the
//!      boundary side usable from other runtimes through the cdylib
//!
//! 3. **Measurement** (`harness` module)
//!    - Times one crossing per call against batched crossings
//!
//! # Example
//!
//! ```rust
//! use std::num::NonZeroUsize;
//! use callbatch::batch::{BatchDispatcher, FlushMode, FunctionRef};
//! use callbatch::boundary::NativeBoundary;
//!
//! let mut dispatcher = BatchDispatcher::with_settings(
//!     FlushMode::Threshold,
//!     NonZeroUsize::new(25).unwrap(),
//!     5,
//!     NativeBoundary::default(),
//! )
//! .unwrap();
//!
//! for i in 0..100u64 {
//!     dispatcher.call(FunctionRef::NOOP, &[i; 5]).unwrap();
//! }
//! let stats = dispatcher.finish().unwrap();
//! assert_eq!(stats.flushes, 4);
//! ```
//!
//! # Calls that need a result
//!
//! A call whose result the caller must observe immediately cannot wait in a
//! batch. Use `BatchDispatcher::call_immediate`, which flushes everything
//! pending and then crosses for that call alone, so ordering is preserved.

pub mod batch;
pub mod boundary;
pub mod config;
pub mod harness;

pub use batch::{
    BatchDispatcher, BatchEncoder, BatchError, BatchResult, BoundaryExecutor, CommandBuffer,
    FlushMode, FlushPolicy, FunctionRef, Slot,
};
pub use boundary::{Boundary, BoundaryKind, FunctionTable, NativeBoundary, RecordingBoundary, ThreadBoundary};
pub use config::{ConfigError, RunConfig, RunSettings};
pub use harness::{run, run_with, RunError, RunReport};
