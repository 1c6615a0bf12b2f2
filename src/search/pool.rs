//! Fixed-size worker pool over scoped threads.
//!
//! [`WorkerPool::run`] drains a [`PrunedQueue`]: each worker pops a batch, expands every item
//! once and pushes the children back. A monitor thread watches for the stop conditions
//! (outstanding work reached zero, collector full, expansion budget spent) and closes the queue,
//! which wakes every blocked worker. Workers report progress to the monitor with `try_send`, so a
//! slow monitor never stalls the pool; the monitor also polls on a short timeout.
//!
//! [`WorkerPool::map`] is the order-preserving data-parallel helper used for layer-at-a-time
//! expansion.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::search::collector::ResultCollector;
use crate::search::limits::Budget;
use crate::search::queue::PrunedQueue;

const MAX_WORKERS: usize = 16;
const BATCH: usize = 16;
const MONITOR_POLL: Duration = Duration::from_millis(5);
const MIN_ITEMS_PER_WORKER: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// `requested == 0` sizes the pool from the available parallelism.
    pub fn new(requested: usize) -> Self {
        let workers = if requested == 0 {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            requested
        };
        Self {
            workers: workers.clamp(1, MAX_WORKERS),
        }
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Expand queued items until the queue closes. `expand` receives one item and appends
    /// `(depth, child)` pairs to the buffer.
    pub fn run<T, F>(
        &self,
        queue: &PrunedQueue<T>,
        collector: &ResultCollector,
        budget: &Budget,
        expand: F,
    ) where
        T: Send,
        F: Fn(T, &mut Vec<(usize, T)>) + Sync,
    {
        if queue.outstanding() == 0 {
            queue.close();
            return;
        }

        let (tick_tx, tick_rx) = bounded::<()>(self.workers * 4);
        thread::scope(|s| {
            for worker in 0..self.workers {
                let tick_tx = tick_tx.clone();
                let expand = &expand;
                s.spawn(move || worker_loop(worker, queue, collector, budget, expand, tick_tx));
            }
            drop(tick_tx);
            s.spawn(move || monitor(queue, collector, budget, tick_rx));
        });
    }

    /// Apply `f` to every item on the pool, preserving input order.
    pub fn map<I, O, F>(&self, items: &[I], f: F) -> Vec<O>
    where
        I: Sync,
        O: Send,
        F: Fn(&I) -> O + Sync,
    {
        let threads = self
            .workers
            .min(items.len() / MIN_ITEMS_PER_WORKER)
            .max(1);
        if threads == 1 {
            return items.iter().map(f).collect();
        }

        let per_thread = items.len().div_ceil(threads);
        thread::scope(|s| {
            let f = &f;
            let handles: Vec<_> = items
                .chunks(per_thread)
                .map(|chunk| s.spawn(move || chunk.iter().map(f).collect::<Vec<O>>()))
                .collect();

            let mut out = Vec::with_capacity(items.len());
            for h in handles {
                match h.join() {
                    Ok(part) => out.extend(part),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            out
        })
    }
}

fn worker_loop<T, F>(
    worker: usize,
    queue: &PrunedQueue<T>,
    collector: &ResultCollector,
    budget: &Budget,
    expand: &F,
    tick_tx: Sender<()>,
) where
    F: Fn(T, &mut Vec<(usize, T)>),
{
    let mut children: Vec<(usize, T)> = Vec::new();
    let mut processed = 0u64;

    while let Some(batch) = queue.pop_batch(BATCH) {
        let n = batch.len();
        for item in batch {
            if collector.is_full() || budget.exhausted() {
                break;
            }
            expand(item, &mut children);
            processed += 1;
        }
        if !children.is_empty() {
            let evicted = queue.push_all(children.drain(..));
            budget.note_evicted(evicted);
        }
        queue.complete(n);
        let _ = tick_tx.try_send(());
    }

    tracing::trace!(worker, processed, "worker stopped");
}

fn monitor<T>(
    queue: &PrunedQueue<T>,
    collector: &ResultCollector,
    budget: &Budget,
    tick_rx: Receiver<()>,
) {
    loop {
        if queue.is_closed() {
            break;
        }
        if collector.is_full() || budget.exhausted() {
            queue.close();
            break;
        }
        match tick_rx.recv_timeout(MONITOR_POLL) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                queue.close();
                break;
            }
        }
    }
}
