/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! The tile work scheduler
//!
//! Tiles are independent work units, so scheduling is a bounded pool
//! of scoped threads pulling indices off a shared atomic counter.
//! Results land in per index slots, which keeps assembly order fixed
//! no matter which worker finished first, encode output is byte
//! identical for any thread count.
//!
//! Cancellation is cooperative: the flag is checked before claiming
//! each work unit, in flight units run to completion and nothing new
//! is dispatched afterwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Cooperative cancellation handle for an encode or decode operation.
///
/// Clones share the same flag, hand one to another thread and cancel
/// from there
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken {
            flag: Arc::new(AtomicBool::new(false))
        }
    }

    /// Request cancellation, no new tiles are dispatched afterwards
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// How a pool run ended without producing every result
pub(crate) enum PoolError<E> {
    /// The cancellation token fired before all units were claimed
    Cancelled,
    /// A work unit failed, lowest failing index wins so the error is
    /// deterministic under any schedule
    Task(E)
}

/// Resolve a `max_threads` knob to an actual worker count.
///
/// Zero consults the machine once, at operation start, later
/// hot-plugs don't change a running operation
pub(crate) fn resolve_threads(requested: u32) -> usize {
    if requested == 0 {
        std::thread::available_parallelism().map_or(1, |n| n.get())
    } else {
        requested as usize
    }
}

/// Run `count` independent work units on up to `threads` workers and
/// collect their results in index order.
///
/// The closure sees each index exactly once. If any unit fails the
/// whole run fails with the lowest-index error, partial results are
/// dropped
pub(crate) fn run_tiles<R, E, F>(
    count: usize, threads: usize, cancel: &CancelToken, job: F
) -> Result<Vec<R>, PoolError<E>>
where
    R: Send,
    E: Send,
    F: Fn(usize) -> Result<R, E> + Sync
{
    let mut slots: Vec<Mutex<Option<Result<R, E>>>> = Vec::with_capacity(count);
    slots.resize_with(count, || Mutex::new(None));

    #[cfg(feature = "threads")]
    if threads.clamp(1, count.max(1)) > 1 {
        use std::sync::atomic::AtomicUsize;

        let workers = threads.clamp(1, count.max(1));
        let next = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    if index >= count {
                        break;
                    }
                    let result = job(index);
                    *slots[index].lock().unwrap() = Some(result);
                });
            }
        });

        return collect(slots, cancel);
    }

    // single threaded path, also taken when the threads feature is off
    for (index, slot) in slots.iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }
        *slot.lock().unwrap() = Some(job(index));
    }
    collect(slots, cancel)
}

fn collect<R, E>(
    slots: Vec<Mutex<Option<Result<R, E>>>>, cancel: &CancelToken
) -> Result<Vec<R>, PoolError<E>> {
    let mut out = Vec::with_capacity(slots.len());
    let mut first_error = None;
    let mut missing = false;

    for slot in slots {
        match slot.into_inner().unwrap() {
            Some(Ok(value)) => out.push(value),
            Some(Err(error)) => {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
            None => missing = true
        }
    }
    if let Some(error) = first_error {
        return Err(PoolError::Task(error));
    }
    if missing {
        // the only way a slot stays empty is a cancellation between
        // dispatches
        debug_assert!(cancel.is_cancelled());
        return Err(PoolError::Cancelled);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_arrive_in_index_order() {
        let cancel = CancelToken::new();
        let results: Vec<usize> =
            run_tiles(64, 8, &cancel, |i| Ok::<_, ()>(i * 3)).unwrap_or_default();
        assert_eq!(results.len(), 64);
        for (i, value) in results.iter().enumerate() {
            assert_eq!(*value, i * 3);
        }
    }

    #[test]
    fn lowest_index_error_wins() {
        let cancel = CancelToken::new();
        let result: Result<Vec<()>, PoolError<usize>> = run_tiles(32, 4, &cancel, |i| {
            if i % 7 == 3 {
                Err(i)
            } else {
                Ok(())
            }
        });
        match result {
            Err(PoolError::Task(index)) => assert_eq!(index, 3),
            _ => panic!("expected the lowest failing index")
        }
    }

    #[test]
    fn cancellation_stops_dispatch() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let result: Result<Vec<usize>, PoolError<()>> = run_tiles(16, 2, &cancel, Ok);
        assert!(matches!(result, Err(PoolError::Cancelled)));
    }

    #[test]
    fn zero_threads_resolves_to_hardware() {
        assert!(resolve_threads(0) >= 1);
        assert_eq!(resolve_threads(3), 3);
    }
}
