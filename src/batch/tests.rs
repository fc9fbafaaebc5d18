//! Dispatcher tests: encoder, policy, and executor working together.

use std::num::NonZeroUsize;

use super::*;
use crate::boundary::{Boundary, RecordingBoundary};

fn dispatcher(
    mode: FlushMode,
    batch_size: usize,
    args: usize,
    boundary: &mut RecordingBoundary,
) -> BatchDispatcher<&mut RecordingBoundary> {
    BatchDispatcher::with_settings(mode, NonZeroUsize::new(batch_size).unwrap(), args, boundary).unwrap()
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_order_preserved_for_all_batch_sizes() {
    for batch_size in [1, 2, 3, 7, 25, 100] {
        let mut boundary = RecordingBoundary::new();
        {
            let mut d = dispatcher(FlushMode::Threshold, batch_size, 1, &mut boundary);
            for i in 0..60u32 {
                d.call(FunctionRef(i % 5), &[i as Slot]).unwrap();
            }
            d.finish().unwrap();
        }

        let seen: Vec<Slot> = boundary.calls().iter().map(|c| c.args[0]).collect();
        let expected: Vec<Slot> = (0..60).collect();
        assert_eq!(seen, expected, "batch_size = {}", batch_size);
        assert!(boundary.calls().iter().enumerate().all(|(i, c)| c.function == FunctionRef(i as u32 % 5)));
    }
}

#[test]
fn test_heterogeneous_arity_round_trips() {
    let mut boundary = RecordingBoundary::new();
    {
        let mut d = dispatcher(FlushMode::Threshold, 4, 2, &mut boundary);
        d.call(FunctionRef(1), &[]).unwrap();
        d.call(FunctionRef(2), &[10, 20, 30]).unwrap();
        d.call(FunctionRef(3), &[40]).unwrap();
        d.finish().unwrap();
    }

    let calls = boundary.calls();
    assert_eq!(calls[0].args.len(), 0);
    assert_eq!(calls[1].args.as_slice(), &[10, 20, 30]);
    assert_eq!(calls[2].args.as_slice(), &[40]);
    assert_eq!(boundary.slots_decoded(), 1 + 4 + 2);
}

// ============================================================================
// Flush points
// ============================================================================

#[test]
fn test_threshold_scenario_with_trailing_batch() {
    // batch_size=2, arg_count=1, call_count=5
    let mut boundary = RecordingBoundary::new();
    {
        let mut d = dispatcher(FlushMode::Threshold, 2, 1, &mut boundary);
        for i in 0..5u64 {
            d.call(FunctionRef::NOOP, &[i]).unwrap();
            let expected_flushes = (i + 1) / 2;
            assert_eq!(d.stats().flushes, expected_flushes);
        }
        assert_eq!(d.pending_calls(), 1);

        let stats = d.finish().unwrap();
        assert_eq!(stats.calls, 5);
        assert_eq!(stats.flushes, 3);
        assert_eq!(stats.slots_flushed, 10);
        assert_eq!(d.pending_calls(), 0);
    }

    let sizes: Vec<usize> = boundary.flushes().iter().map(|f| f.slots).collect();
    assert_eq!(sizes, vec![4, 4, 2]);
    assert_eq!(boundary.slots_decoded(), 10);
    let flush_of: Vec<Option<usize>> = boundary.calls().iter().map(|c| c.flush).collect();
    assert_eq!(flush_of, vec![Some(0), Some(0), Some(1), Some(1), Some(2)]);
}

#[test]
fn test_modulo_scenario_reproduces_first_call_flush() {
    let mut boundary = RecordingBoundary::new();
    {
        let mut d = dispatcher(FlushMode::Modulo, 2, 1, &mut boundary);
        for i in 0..5u64 {
            d.call(FunctionRef::NOOP, &[i]).unwrap();
        }
        assert_eq!(d.pending_calls(), 0);
        let stats = d.finish().unwrap();
        assert_eq!(stats.flushes, 3);
    }

    let sizes: Vec<usize> = boundary.flushes().iter().map(|f| f.slots).collect();
    assert_eq!(sizes, vec![2, 4, 4]);
    assert_eq!(boundary.slots_decoded(), 10);
}

#[test]
fn test_flush_once_every_batch_size_calls() {
    for batch_size in 1..=10usize {
        let mut boundary = RecordingBoundary::new();
        let calls = 100usize;
        {
            let mut d = dispatcher(FlushMode::Threshold, batch_size, 0, &mut boundary);
            for _ in 0..calls {
                d.call(FunctionRef::NOOP, &[]).unwrap();
            }
            d.finish().unwrap();
        }
        let full = calls / batch_size;
        let trailing = usize::from(calls % batch_size != 0);
        assert_eq!(boundary.flushes().len(), full + trailing);
        assert!(boundary.flushes()[..full].iter().all(|f| f.entries == batch_size));
    }
}

#[test]
fn test_flush_with_nothing_pending_does_not_cross() {
    let mut boundary = RecordingBoundary::new();
    {
        let mut d = dispatcher(FlushMode::Threshold, 3, 0, &mut boundary);
        d.flush().unwrap();
        d.finish().unwrap();
    }
    assert_eq!(boundary.crossings(), 0);
}

// ============================================================================
// Buffer reuse
// ============================================================================

#[test]
fn test_buffer_empty_after_every_flush_and_capacity_monotone() {
    let mut boundary = RecordingBoundary::new();
    let mut d = dispatcher(FlushMode::Threshold, 4, 3, &mut boundary);
    let mut last_capacity = d.encoder().buffer().capacity();

    for i in 0..400u64 {
        // Vary the arity so later batches need more room than the hint
        let args: Vec<Slot> = (0..(i % 9)).collect();
        let before = d.stats().flushes;
        d.call(FunctionRef(1), &args).unwrap();
        if d.stats().flushes > before {
            assert_eq!(d.encoder().buffer().len(), 0);
        }
        let capacity = d.encoder().buffer().capacity();
        assert!(capacity >= last_capacity);
        last_capacity = capacity;
    }
    let stats = d.finish().unwrap();
    assert_eq!(stats.capacity, last_capacity);
    assert!(stats.peak_slots <= stats.capacity);
}

// ============================================================================
// Immediate calls
// ============================================================================

#[test]
fn test_call_immediate_flushes_pending_first() {
    let mut boundary = RecordingBoundary::new();
    {
        let mut d = dispatcher(FlushMode::Threshold, 10, 0, &mut boundary);
        d.call(FunctionRef(1), &[]).unwrap();
        d.call(FunctionRef(2), &[]).unwrap();
        d.call_immediate(FunctionRef(9)).unwrap();
        d.call(FunctionRef(3), &[]).unwrap();
        let stats = d.finish().unwrap();
        assert_eq!(stats.immediate_calls, 1);
        assert_eq!(stats.flushes, 2);
    }

    let order: Vec<u32> = boundary.calls().iter().map(|c| c.function.0).collect();
    assert_eq!(order, vec![1, 2, 9, 3]);
    assert_eq!(boundary.calls()[2].flush, None);
    assert_eq!(boundary.direct_calls(), 1);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_unknown_function_aborts_flush() {
    let mut boundary = RecordingBoundary::with_known_functions(2);
    {
        let mut d = dispatcher(FlushMode::Threshold, 2, 0, &mut boundary);
        d.call(FunctionRef(0), &[]).unwrap();
        let err = d.call(FunctionRef(5), &[]).unwrap_err();
        assert!(matches!(err, BatchError::UnknownFunction(FunctionRef(5))));
        // The failed batch was not delivered, but both calls were encoded
        assert_eq!(d.pending_calls(), 2);
        assert_eq!(d.stats().calls, 2);
        assert_eq!(d.stats().calls, d.encoder().calls_encoded());
        assert_eq!(d.stats().flushes, 0);
    }
    assert!(boundary.calls().is_empty());
}

#[test]
fn test_call_count_matches_encoded_calls() {
    let mut boundary = RecordingBoundary::new();
    let mut d = dispatcher(FlushMode::Modulo, 3, 2, &mut boundary);
    assert_eq!(d.stats().calls, 0);

    for i in 0..10u64 {
        d.call(FunctionRef::NOOP, &[i, i]).unwrap();
        assert_eq!(d.stats().calls, i + 1);
    }
    d.call_immediate(FunctionRef(1)).unwrap();
    let stats = d.finish().unwrap();

    // Immediate calls are tracked separately from encoded ones
    assert_eq!(stats.calls, 10);
    assert_eq!(stats.immediate_calls, 1);
    assert_eq!(stats.calls, d.encoder().calls_encoded());
}

#[test]
fn test_boundary_name_passes_through_mut_ref() {
    let mut boundary = RecordingBoundary::new();
    let d = dispatcher(FlushMode::Threshold, 1, 0, &mut boundary);
    assert_eq!(d.boundary().name(), "recording");
}
