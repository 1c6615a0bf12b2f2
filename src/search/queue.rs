//! Bounded, depth-prioritized work queue shared by the worker pool.
//!
//! - Pops return the shallowest items first.
//! - When the queue grows past its capacity the deepest (most recently queued) items are evicted.
//! - An outstanding-item counter covers both queued items and items a worker is still expanding.
//!   It is incremented on push and decremented by [`PrunedQueue::complete`] or on eviction; when
//!   it reaches zero the queue closes itself.
//!
//! Workers must push an item's children *before* completing the item, otherwise the counter can
//! touch zero while work is still being produced.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};

pub struct PrunedQueue<T> {
    inner: Mutex<Levels<T>>,
    ready: Condvar,
    outstanding: AtomicUsize,
    closed: AtomicBool,
    capacity: usize,
}

struct Levels<T> {
    by_depth: BTreeMap<usize, VecDeque<T>>,
    len: usize,
}

impl<T> PrunedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Levels {
                by_depth: BTreeMap::new(),
                len: 0,
            }),
            ready: Condvar::new(),
            outstanding: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            capacity: capacity.max(1),
        }
    }

    /// Queue items; returns how many queued items were evicted to stay within capacity.
    pub fn push_all(&self, items: impl IntoIterator<Item = (usize, T)>) -> usize {
        if self.is_closed() {
            return 0;
        }
        let mut added = 0usize;
        let mut evicted = 0usize;
        {
            let mut g = self.inner.lock();
            for (depth, item) in items {
                g.by_depth.entry(depth).or_default().push_back(item);
                g.len += 1;
                added += 1;
            }
            self.outstanding.fetch_add(added, Ordering::SeqCst);

            while g.len > self.capacity {
                let Some(mut deepest) = g.by_depth.last_entry() else {
                    break;
                };
                deepest.get_mut().pop_back();
                if deepest.get().is_empty() {
                    deepest.remove();
                }
                g.len -= 1;
                evicted += 1;
            }
        }

        if added > 0 {
            self.ready.notify_all();
        }
        if evicted > 0 {
            tracing::trace!(evicted, capacity = self.capacity, "queue pruned");
            self.complete(evicted);
        }
        evicted
    }

    pub fn push(&self, depth: usize, item: T) -> usize {
        self.push_all(std::iter::once((depth, item)))
    }

    /// Block until items are available and take up to `max` of the shallowest ones.
    /// Returns `None` once the queue is closed.
    pub fn pop_batch(&self, max: usize) -> Option<Vec<T>> {
        let mut g = self.inner.lock();
        loop {
            if self.is_closed() {
                return None;
            }
            if g.len > 0 {
                let mut batch = Vec::with_capacity(max.min(g.len));
                while batch.len() < max {
                    let Some(mut shallowest) = g.by_depth.first_entry() else {
                        break;
                    };
                    if let Some(item) = shallowest.get_mut().pop_front() {
                        batch.push(item);
                    }
                    if shallowest.get().is_empty() {
                        shallowest.remove();
                    }
                }
                g.len -= batch.len();
                return Some(batch);
            }
            self.ready.wait(&mut g);
        }
    }

    /// Mark `n` popped (or evicted) items as fully processed.
    pub fn complete(&self, n: usize) {
        if n == 0 {
            return;
        }
        let prev = self.outstanding.fetch_sub(n, Ordering::SeqCst);
        debug_assert!(prev >= n, "completed more items than were queued");
        if prev == n {
            self.close();
        }
    }

    /// Stop the queue: blocked and future pops return `None`, pushes are ignored.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // Take the lock so a worker between its closed-check and `wait` cannot miss the wakeup.
        let _g = self.inner.lock();
        self.ready.notify_all();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
