//! Bounded, deduplicating result collector shared by all workers of one search.
//!
//! The collector keeps the `capacity` smallest trees by `(rank, signature)`. Strategies that
//! produce results in a fixed order offer them with rank 0 and the collector seals itself as soon
//! as it holds `capacity` trees. Strategies whose completion order depends on scheduling call
//! [`ResultCollector::hold_open`] first: offers then displace larger entries, and the collector
//! is sealed only through [`ResultCollector::settle`], once no better tree can still arrive.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::codec::canonicalize;
use crate::core::tree::DerivationTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    Duplicate,
    /// Sealed, or (while held open) not better than anything kept.
    Full,
}

pub struct ResultCollector {
    capacity: usize,
    inner: Mutex<Collected>,
    sealed: AtomicBool,
    held_open: AtomicBool,
}

#[derive(Default)]
struct Collected {
    /// Every signature ever kept, including displaced ones.
    seen: FxHashSet<String>,
    kept: BTreeMap<(usize, String), DerivationTree>,
    /// A tree was displaced or turned away for lack of room.
    overflowed: bool,
}

impl ResultCollector {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Collected::default()),
            sealed: AtomicBool::new(capacity == 0),
            held_open: AtomicBool::new(false),
        }
    }

    /// Stop sealing automatically at capacity; see [`ResultCollector::settle`].
    pub fn hold_open(&self) {
        self.held_open.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_held_open(&self) -> bool {
        self.held_open.load(Ordering::Acquire)
    }

    pub fn offer(&self, tree: DerivationTree) -> Offer {
        if self.is_full() {
            return Offer::Full;
        }
        let sig = canonicalize(&tree);
        self.offer_ranked(0, sig, tree)
    }

    /// Offer a tree whose canonical signature the caller already computed.
    pub fn offer_ranked(&self, rank: usize, signature: String, tree: DerivationTree) -> Offer {
        let mut g = self.inner.lock();
        if self.is_full() {
            g.overflowed = true;
            return Offer::Full;
        }
        if g.seen.contains(&signature) {
            return Offer::Duplicate;
        }
        if g.kept.len() >= self.capacity {
            g.overflowed = true;
            let displaces = g
                .kept
                .last_key_value()
                .is_some_and(|((r, s), _)| (rank, signature.as_str()) < (*r, s.as_str()));
            if !displaces {
                return Offer::Full;
            }
            g.kept.pop_last();
        }
        g.seen.insert(signature.clone());
        g.kept.insert((rank, signature), tree);
        if g.kept.len() >= self.capacity && !self.is_held_open() {
            self.sealed.store(true, Ordering::Release);
        }
        Offer::Accepted
    }

    /// Seal a held-open collector once it is at capacity and every kept rank is below
    /// `next_rank`, the smallest rank any future offer can have (`None`: no more offers).
    pub fn settle(&self, next_rank: Option<usize>) -> bool {
        if self.is_full() {
            return true;
        }
        let g = self.inner.lock();
        if g.kept.len() < self.capacity {
            return false;
        }
        let worst = g.kept.last_key_value().map_or(0, |((r, _), _)| *r);
        if next_rank.is_some_and(|next| worst >= next) {
            return false;
        }
        self.sealed.store(true, Ordering::Release);
        true
    }

    /// Lock-free check used by workers to stop early.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Whether `max_results` cut the result set.
    pub fn truncated(&self) -> bool {
        self.is_full() || self.inner.lock().overflowed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copies of the kept trees ordered by canonical signature.
    pub fn sorted_trees(&self) -> Vec<DerivationTree> {
        let g = self.inner.lock();
        let mut trees: Vec<(&String, &DerivationTree)> =
            g.kept.iter().map(|((_, s), t)| (s, t)).collect();
        trees.sort_by(|a, b| a.0.cmp(b.0));
        trees.into_iter().map(|(_, t)| t.clone()).collect()
    }

    /// Kept trees ordered by canonical signature.
    pub fn into_sorted(self) -> Vec<DerivationTree> {
        let mut trees: Vec<(String, DerivationTree)> = self
            .inner
            .into_inner()
            .kept
            .into_iter()
            .map(|((_, s), t)| (s, t))
            .collect();
        trees.sort_by(|a, b| a.0.cmp(&b.0));
        trees.into_iter().map(|(_, t)| t).collect()
    }
}
