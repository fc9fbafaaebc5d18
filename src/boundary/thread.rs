//! Boundary thread
//!
//! The boundary side lives on its own thread. Each crossing is a blocking
//! round trip over a pair of crossbeam rendezvous channels, which gives every
//! crossing a real, fixed cost independent of how much work it carries:
//!
//! ```text
//!   caller thread                         boundary thread
//!   ─────────────                         ───────────────
//!   send(Crossing::Batch(view)) ───────>  recv
//!   recv  (blocked)                        callbatch_drain(table, len, ptr)
//!   recv  <─────────────────────────────   send(summary)
//! ```
//!
//! Batches are handed over as borrowed views, not copies. The caller stays
//! blocked on the reply for as long as the view is in use, so the command
//! buffer still has exactly one accessor at any moment.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::batch::{BatchError, BatchResult, ExecSummary, FunctionRef, Slot};

use super::ffi::{drain_native, invoke_native};
use super::registry::FunctionTable;
use super::Boundary;

/// Borrowed batch travelling to the boundary thread
struct BatchView {
    ptr: *const Slot,
    len: usize,
}

// SAFETY: a view is only created in `execute_batch`, which blocks until the
// boundary thread has replied, so the pointed-to slots outlive every use and
// are not mutated meanwhile.
unsafe impl Send for BatchView {}

/// One request to the boundary thread
enum Crossing {
    Direct(FunctionRef),
    Batch(BatchView),
}

/// Boundary whose crossings are round trips to a dedicated thread
pub struct ThreadBoundary {
    requests: Option<Sender<Crossing>>,
    replies: Receiver<BatchResult<ExecSummary>>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ThreadBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadBoundary")
            .field("running", &self.worker.is_some())
            .finish()
    }
}

impl ThreadBoundary {
    /// Spawn the boundary thread, which takes ownership of `table`
    pub fn spawn(table: FunctionTable) -> std::io::Result<Self> {
        let (request_tx, request_rx) = bounded::<Crossing>(0);
        let (reply_tx, reply_rx) = bounded::<BatchResult<ExecSummary>>(0);

        let worker = thread::Builder::new()
            .name("callbatch-boundary".to_string())
            .spawn(move || boundary_loop(table, request_rx, reply_tx))?;

        debug!(target: "callbatch::boundary", "boundary thread started");
        Ok(Self {
            requests: Some(request_tx),
            replies: reply_rx,
            worker: Some(worker),
        })
    }

    fn round_trip(&mut self, crossing: Crossing) -> BatchResult<ExecSummary> {
        let requests = self.requests.as_ref().ok_or(BatchError::Disconnected)?;
        requests.send(crossing).map_err(|_| BatchError::Disconnected)?;
        self.replies.recv().map_err(|_| BatchError::Disconnected)?
    }
}

impl Boundary for ThreadBoundary {
    fn name(&self) -> &'static str {
        "thread"
    }

    fn call_direct(&mut self, function: FunctionRef) -> BatchResult<()> {
        self.round_trip(Crossing::Direct(function)).map(|_| ())
    }

    fn execute_batch(&mut self, batch: &[Slot]) -> BatchResult<ExecSummary> {
        let view = BatchView {
            ptr: batch.as_ptr(),
            len: batch.len(),
        };
        self.round_trip(Crossing::Batch(view))
    }
}

impl Drop for ThreadBoundary {
    fn drop(&mut self) {
        // Closing the request channel ends the boundary loop
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(target: "callbatch::boundary", "boundary thread panicked");
            }
        }
    }
}

fn boundary_loop(
    table: FunctionTable,
    requests: Receiver<Crossing>,
    replies: Sender<BatchResult<ExecSummary>>,
) {
    for crossing in requests {
        let reply = match crossing {
            Crossing::Direct(function) => invoke_native(&table, function).map(|_| ExecSummary {
                entries: 1,
                slots: 0,
            }),
            Crossing::Batch(view) => {
                let batch: &[Slot] = if view.len == 0 {
                    &[]
                } else {
                    // SAFETY: see `BatchView`; the sender is blocked on `replies`.
                    unsafe { std::slice::from_raw_parts(view.ptr, view.len) }
                };
                drain_native(&table, batch)
            }
        };
        if replies.send(reply).is_err() {
            break;
        }
    }
    debug!(target: "callbatch::boundary", "boundary thread stopped");
}
