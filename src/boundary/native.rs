//! Crossings through the C ABI on the caller's thread.

use tracing::debug;

use crate::batch::{BatchResult, ExecSummary, FunctionRef, Slot};

use super::ffi::{drain_native, invoke_native};
use super::registry::FunctionTable;
use super::Boundary;

/// Boundary whose every crossing is one call to an exported `extern "C"` entry point
#[derive(Debug, Clone)]
pub struct NativeBoundary {
    table: FunctionTable,
}

impl Default for NativeBoundary {
    fn default() -> Self {
        Self::new(FunctionTable::with_noop())
    }
}

impl NativeBoundary {
    pub fn new(table: FunctionTable) -> Self {
        debug!(target: "callbatch::boundary", functions = table.len(), "native boundary ready");
        Self { table }
    }

    pub fn table(&self) -> &FunctionTable {
        &self.table
    }
}

impl Boundary for NativeBoundary {
    fn name(&self) -> &'static str {
        "native"
    }

    #[inline]
    fn call_direct(&mut self, function: FunctionRef) -> BatchResult<()> {
        invoke_native(&self.table, function)
    }

    #[inline]
    fn execute_batch(&mut self, batch: &[Slot]) -> BatchResult<ExecSummary> {
        drain_native(&self.table, batch)
    }
}
