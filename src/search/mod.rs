//! Search strategies and the machinery they share.
//!
//! Every strategy implements [`Strategy`] and reports its trees through
//! [`SearchContext::accept`], which deduplicates, enforces `max_results` and emits the `result`
//! event. The engine owns everything in the context; strategies only borrow it.

pub mod bfs;
pub mod bidirectional;
pub mod collector;
pub mod dfs;
pub mod events;
pub mod limits;
pub mod pool;
pub mod queue;

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::catalog::registry::Registry;
use crate::codec::{canonicalize, node_signature};
use crate::core::element::ElementId;
use crate::core::tree::DerivationTree;
use crate::error::SearchError;
use crate::search::collector::{Offer, ResultCollector};
use crate::search::events::{EventEmitter, EventStatus, SearchEvent};
use crate::search::limits::Budget;
use crate::search::pool::WorkerPool;

/// How the BFS strategy explores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BfsMode {
    /// `Shortest` for a single result, `Trees` otherwise.
    #[default]
    Auto,
    Shortest,
    Paths,
    /// Open-set search on the worker pool. An element keeps one recipe per tree, so a tree that
    /// builds the same intermediate two different ways is never produced here (DFS can produce
    /// it); counts may differ from DFS on such catalogs.
    Trees,
}

impl BfsMode {
    pub fn resolve(self, max_results: usize) -> BfsMode {
        match self {
            BfsMode::Auto if max_results <= 1 => BfsMode::Shortest,
            BfsMode::Auto => BfsMode::Trees,
            other => other,
        }
    }
}

impl FromStr for BfsMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BfsMode::Auto),
            "shortest" => Ok(BfsMode::Shortest),
            "paths" => Ok(BfsMode::Paths),
            "trees" => Ok(BfsMode::Trees),
            other => Err(SearchError::invalid_request(format!(
                "unknown bfs mode {other:?} (expected auto, shortest, paths or trees)"
            ))),
        }
    }
}

impl fmt::Display for BfsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BfsMode::Auto => "auto",
            BfsMode::Shortest => "shortest",
            BfsMode::Paths => "paths",
            BfsMode::Trees => "trees",
        };
        f.write_str(s)
    }
}

/// Per-request knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Complete path-derived trees down to primitives (BFS path modes).
    pub expand_to_basics: bool,
    /// Alternatives kept per intermediate element (bidirectional).
    pub max_recipes_per_element: usize,
    /// Stream events while searching; only honored by `Engine::search_live`.
    pub live_update: bool,
    /// Pause after each streamed event.
    pub delay_ms: u64,
    pub bfs_mode: BfsMode,
    /// Use the worker pool / fork-join; `false` runs everything on the calling thread.
    pub parallel: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            expand_to_basics: true,
            max_recipes_per_element: 10,
            live_update: false,
            delay_ms: 0,
            bfs_mode: BfsMode::Auto,
            parallel: true,
        }
    }
}

/// Everything one search run borrows from the engine.
pub struct SearchContext<'a> {
    pub registry: &'a Registry,
    pub target: ElementId,
    pub max_results: usize,
    pub options: &'a SearchOptions,
    pub budget: &'a Budget,
    pub collector: &'a ResultCollector,
    pub events: &'a EventEmitter,
    pub pool: WorkerPool,
}

impl SearchContext<'_> {
    /// Offer a finished tree for the target.
    pub fn accept(&self, tree: DerivationTree) -> Offer {
        self.accept_ranked(0, tree)
    }

    /// Offer a tree with a rank; a held-open collector prefers lower ranks.
    pub fn accept_ranked(&self, rank: usize, tree: DerivationTree) -> Offer {
        let sig = canonicalize(&tree);
        self.offer(rank, sig, tree)
    }

    pub fn accept_signed(&self, signature: String, tree: DerivationTree) -> Offer {
        self.offer(0, signature, tree)
    }

    fn offer(&self, rank: usize, signature: String, tree: DerivationTree) -> Offer {
        // A held-open collector may still displace the tree; its results are announced at the end.
        let announce = self.events.is_enabled() && !self.collector.is_held_open();
        let preview = announce.then(|| tree.clone());
        let offer = self.collector.offer_ranked(rank, signature, tree);
        if offer == Offer::Accepted {
            tracing::trace!(target_id = %self.target, rank, "result accepted");
            if let Some(tree) = preview {
                self.result_event(tree);
            }
        }
        offer
    }

    /// Emit one `result` event per kept tree, in signature order.
    pub fn announce_results(&self) {
        if !self.events.is_enabled() {
            return;
        }
        for tree in self.collector.sorted_trees() {
            self.result_event(tree);
        }
    }

    fn result_event(&self, tree: DerivationTree) {
        self.events.milestone(
            SearchEvent::new(
                EventStatus::Result,
                format!("found derivation of {}", self.target_name()),
                self.budget.nodes_visited(),
            )
            .with_tree(tree),
        );
    }

    /// Whether the search should wind down.
    #[inline]
    pub fn should_stop(&self) -> bool {
        self.collector.is_full() || self.budget.exhausted()
    }

    pub fn target_name(&self) -> &str {
        self.registry.display(self.target)
    }

    pub fn preview(&self, message: impl Into<String>, tree: Option<DerivationTree>) {
        if self.events.is_enabled() {
            self.events
                .preview(message, tree, self.budget.nodes_visited());
        }
    }
}

/// One search algorithm.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Explore from `ctx.target`, handing every finished tree to [`SearchContext::accept`].
    fn search(&self, ctx: &SearchContext<'_>);
}

/// Distinct derivation trees of one element, each with its canonical signature.
#[derive(Debug, Clone, Default)]
pub struct Alternatives {
    trees: Vec<DerivationTree>,
    signatures: Vec<String>,
    index: FxHashSet<String>,
}

impl Alternatives {
    pub fn leaf(name: &str) -> Self {
        let mut alts = Alternatives::default();
        let tree = DerivationTree::leaf(name);
        alts.push(canonicalize(&tree), tree);
        alts
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.index.contains(signature)
    }

    /// Adds the tree unless an identical one is already held.
    pub fn push(&mut self, signature: String, tree: DerivationTree) -> bool {
        if !self.index.insert(signature.clone()) {
            return false;
        }
        self.signatures.push(signature);
        self.trees.push(tree);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DerivationTree, &str)> + '_ {
        self.trees
            .iter()
            .zip(self.signatures.iter().map(String::as_str))
    }

    pub fn first(&self) -> Option<&DerivationTree> {
        self.trees.first()
    }
}

/// Combine every pair of `left` × `right` into `name{l, r}` nodes that `keep` accepts, stopping
/// after `limit` new trees.
pub(crate) fn combine_pairs(
    name: &str,
    left: &Alternatives,
    right: &Alternatives,
    limit: usize,
    mut keep: impl FnMut(&str) -> bool,
    out: &mut Vec<(String, DerivationTree)>,
) {
    if limit == 0 {
        return;
    }
    let start = out.len();
    for (lt, ls) in left.iter() {
        for (rt, rs) in right.iter() {
            let sig = node_signature(name, vec![ls.to_string(), rs.to_string()]);
            if !keep(&sig) {
                continue;
            }
            out.push((sig, DerivationTree::combine(name, lt.clone(), rt.clone())));
            if out.len() - start >= limit {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_mode_depends_on_result_count() {
        assert_eq!(BfsMode::Auto.resolve(1), BfsMode::Shortest);
        assert_eq!(BfsMode::Auto.resolve(5), BfsMode::Trees);
        assert_eq!(BfsMode::Paths.resolve(1), BfsMode::Paths);
        assert_eq!("Trees".parse::<BfsMode>().unwrap(), BfsMode::Trees);
        assert!("sideways".parse::<BfsMode>().is_err());
    }

    #[test]
    fn doubled_recipes_do_not_mirror() {
        let mut side = Alternatives::leaf("Air");
        let fire = DerivationTree::leaf("Fire");
        assert!(side.push(canonicalize(&fire), fire.clone()));
        assert!(!side.push(canonicalize(&fire), fire));

        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        combine_pairs(
            "Pressure",
            &side,
            &side,
            10,
            |s| seen.insert(s.to_string()),
            &mut out,
        );
        // (air, fire) and (fire, air) are one tree.
        assert_eq!(out.len(), 3);

        let mut capped = Vec::new();
        combine_pairs("Pressure", &side, &side, 2, |_| true, &mut capped);
        assert_eq!(capped.len(), 2);
    }
}
