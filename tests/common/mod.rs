//! Shared helpers for callbatch integration tests
//!
//! - Building validated run settings without repeating defaults
//! - A function table whose functions append their own id to a global trace
#![allow(dead_code)]

use std::sync::Mutex;

use callbatch::batch::{FlushMode, FunctionRef};
use callbatch::boundary::{BoundaryKind, FunctionTable};
use callbatch::config::{RunConfig, RunSettings};

/// Validated settings for a native-boundary run
pub fn settings(batch_size: usize, arg_count: usize, call_count: u64, flush_mode: FlushMode) -> RunSettings {
    RunConfig {
        batch_size,
        arg_count,
        call_count,
        flush_mode,
        boundary: BoundaryKind::Native,
    }
    .validate()
    .expect("test settings are valid")
}

/// Ids appended by the tracing functions, in invocation order
///
/// Shared by every test in a binary: only one test per binary may use it.
pub static TRACE: Mutex<Vec<u8>> = Mutex::new(Vec::new());

fn record(id: u8) {
    TRACE.lock().expect("trace lock poisoned").push(id);
}

extern "C" fn trace_a() {
    record(b'a');
}

extern "C" fn trace_b() {
    record(b'b');
}

extern "C" fn trace_c() {
    record(b'c');
}

/// Table with `noop` plus three tracing functions; returns their references
pub fn tracing_table() -> (FunctionTable, [FunctionRef; 3]) {
    let mut table = FunctionTable::with_noop();
    let a = table.register("trace_a", trace_a);
    let b = table.register("trace_b", trace_b);
    let c = table.register("trace_c", trace_c);
    (table, [a, b, c])
}

/// Drain the trace into a string such as "abcab"
pub fn take_trace() -> String {
    let mut trace = TRACE.lock().expect("trace lock poisoned");
    String::from_utf8(std::mem::take(&mut *trace)).expect("trace ids are ASCII")
}
