//! Soft limits and the shared budget tracker.
//!
//! Searches can explode combinatorially on large catalogs, and there is no external abort
//! signal. Instead every strategy charges its work against a [`Budget`]:
//! - `max_depth`: expansion depth / layer count,
//! - `max_queue_size`: pending partial derivations (excess is evicted, deepest first),
//! - `max_expansions`: generic loop-iteration guard,
//! - the caller's `max_results` (tracked by the result collector).
//!
//! Reaching a limit truncates the search; it is reported in [`LimitHits`], never as an error.
//! Counters are atomic because workers charge them concurrently.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    pub max_depth: usize,
    pub max_queue_size: usize,
    pub max_expansions: u64,
    /// DFS: intermediate elements keep up to `max_results * dfs_intermediate_factor`
    /// alternatives (the target keeps `max_results`).
    pub dfs_intermediate_factor: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: 20,
            max_queue_size: 100_000,
            max_expansions: 2_000_000,
            dfs_intermediate_factor: 3,
        }
    }
}

/// Which soft limits truncated a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitHits {
    pub results: bool,
    pub depth: bool,
    pub queue: bool,
    pub expansions: bool,
}

impl LimitHits {
    #[inline]
    pub fn any(&self) -> bool {
        self.results || self.depth || self.queue || self.expansions
    }
}

#[derive(Debug)]
pub struct Budget {
    limits: SearchLimits,
    nodes_visited: AtomicU64,
    expansions: AtomicU64,
    evicted: AtomicU64,
    depth_cut: AtomicBool,
    expansions_hit: AtomicBool,
}

impl Budget {
    pub fn new(limits: SearchLimits) -> Self {
        Self {
            limits,
            nodes_visited: AtomicU64::new(0),
            expansions: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            depth_cut: AtomicBool::new(false),
            expansions_hit: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    #[inline]
    pub fn visit(&self, n: u64) {
        self.nodes_visited.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn nodes_visited(&self) -> u64 {
        self.nodes_visited.load(Ordering::Relaxed)
    }

    /// Charge one expansion. Returns false (and records the hit) once the budget is spent.
    pub fn try_expand(&self, stage: &'static str) -> bool {
        let observed = self.expansions.fetch_add(1, Ordering::Relaxed) + 1;
        if observed <= self.limits.max_expansions {
            return true;
        }
        if !self.expansions_hit.swap(true, Ordering::Relaxed) {
            tracing::debug!(
                stage,
                metric = "expansions",
                limit = self.limits.max_expansions,
                "expansion budget exhausted"
            );
        }
        false
    }

    #[inline]
    pub fn exhausted(&self) -> bool {
        self.expansions_hit.load(Ordering::Relaxed)
    }

    /// Whether `depth` is still within `max_depth`; records the cut otherwise.
    pub fn allow_depth(&self, stage: &'static str, depth: usize) -> bool {
        if depth <= self.limits.max_depth {
            return true;
        }
        if !self.depth_cut.swap(true, Ordering::Relaxed) {
            tracing::debug!(stage, limit = self.limits.max_depth, "depth limit reached");
        }
        false
    }

    pub fn note_evicted(&self, n: usize) {
        if n > 0 {
            self.evicted.fetch_add(n as u64, Ordering::Relaxed);
        }
    }

    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    pub fn hits(&self, results_full: bool) -> LimitHits {
        LimitHits {
            results: results_full,
            depth: self.depth_cut.load(Ordering::Relaxed),
            queue: self.evicted() > 0,
            expansions: self.exhausted(),
        }
    }
}
