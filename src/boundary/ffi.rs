//! C ABI entry points of the boundary side
//!
//! Every crossing made by [`NativeBoundary`](super::NativeBoundary) and
//! [`ThreadBoundary`](super::ThreadBoundary) goes through one of these two
//! functions. They are exported unmangled so a host in another runtime can
//! link against the cdylib and drive the same executor.
use std::ffi::c_void;

use crate::batch::{BatchError, BatchResult, BoundaryExecutor, ExecSummary, FunctionRef, Slot};

use super::registry::FunctionTable;

/// The batch or call completed
pub const STATUS_OK: i32 = 0;
/// A header overran the batch; see `fault_offset` / `fault_arg_count`
pub const STATUS_CORRUPTED: i32 = 1;
/// A header referenced an unknown function; see `fault_function`
pub const STATUS_UNKNOWN_FUNCTION: i32 = 2;
/// The table or batch pointer was null
pub const STATUS_NULL_POINTER: i32 = 3;

/// Out-parameter filled by [`callbatch_drain`]
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries invoked
    pub entries: usize,
    /// Slots consumed
    pub slots: usize,
    pub fault_offset: usize,
    pub fault_arg_count: usize,
    pub fault_function: u32,
}

/// Invoke a single function: one crossing, one call
///
/// # Safety
/// - `table` must point to a live `FunctionTable` (or be null)
#[no_mangle]
#[inline(never)]
pub unsafe extern "C" fn callbatch_invoke(table: *const c_void, function: u32) -> i32 {
    let Some(table) = table.cast::<FunctionTable>().as_ref() else {
        return STATUS_NULL_POINTER;
    };
    match table.get(FunctionRef(function)) {
        Some(func) => {
            func();
            STATUS_OK
        }
        None => STATUS_UNKNOWN_FUNCTION,
    }
}

/// Decode and execute `len` slots starting at `data`: one crossing, many calls
///
/// # Safety
/// - `table` must point to a live `FunctionTable` (or be null)
/// - `data` must be valid for reads of `len` slots (or null when `len` is 0)
/// - `report` must be writable (or null to discard it)
#[no_mangle]
#[inline(never)]
pub unsafe extern "C" fn callbatch_drain(
    table: *const c_void,
    len: usize,
    data: *const Slot,
    report: *mut DrainReport,
) -> i32 {
    let Some(table) = table.cast::<FunctionTable>().as_ref() else {
        return STATUS_NULL_POINTER;
    };
    let slots: &[Slot] = if len == 0 {
        &[]
    } else if data.is_null() {
        return STATUS_NULL_POINTER;
    } else {
        std::slice::from_raw_parts(data, len)
    };

    let mut sink = table;
    let mut out = DrainReport::default();
    let status = match BoundaryExecutor::new().execute(slots, len, &mut sink) {
        Ok(summary) => {
            out.entries = summary.entries;
            out.slots = summary.slots;
            STATUS_OK
        }
        Err(BatchError::Corrupted { offset, arg_count, .. }) => {
            out.fault_offset = offset;
            out.fault_arg_count = arg_count;
            STATUS_CORRUPTED
        }
        Err(BatchError::UnknownFunction(function)) => {
            out.fault_function = function.0;
            STATUS_UNKNOWN_FUNCTION
        }
        Err(_) => STATUS_CORRUPTED,
    };

    if let Some(report) = report.as_mut() {
        *report = out;
    }
    status
}

/// Cross once to invoke `function`, translating the status code
pub(crate) fn invoke_native(table: &FunctionTable, function: FunctionRef) -> BatchResult<()> {
    let table_ptr = (table as *const FunctionTable).cast::<c_void>();
    // SAFETY: `table` is a live reference for the duration of the call.
    let status = unsafe { callbatch_invoke(table_ptr, function.0) };
    match status {
        STATUS_OK => Ok(()),
        STATUS_UNKNOWN_FUNCTION => Err(BatchError::UnknownFunction(function)),
        _ => Err(BatchError::NullPointer),
    }
}

/// Cross once to execute `batch`, translating the status code
pub(crate) fn drain_native(table: &FunctionTable, batch: &[Slot]) -> BatchResult<ExecSummary> {
    let table_ptr = (table as *const FunctionTable).cast::<c_void>();
    let mut report = DrainReport::default();
    // SAFETY: `table` and `batch` are live borrows for the duration of the call,
    // and `report` is a local.
    let status = unsafe { callbatch_drain(table_ptr, batch.len(), batch.as_ptr(), &mut report) };
    match status {
        STATUS_OK => Ok(ExecSummary {
            entries: report.entries,
            slots: report.slots,
        }),
        STATUS_CORRUPTED => Err(BatchError::Corrupted {
            offset: report.fault_offset,
            arg_count: report.fault_arg_count,
            len: batch.len(),
        }),
        STATUS_UNKNOWN_FUNCTION => Err(BatchError::UnknownFunction(FunctionRef(report.fault_function))),
        _ => Err(BatchError::NullPointer),
    }
}
