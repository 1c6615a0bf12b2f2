//! Breadth-first search.
//!
//! Two families:
//! - path search (`Shortest`, `Paths`): walk forward from the primitives over the
//!   `products_of` index until the target is reached, then turn each path into a tree;
//! - open-set search (`Trees`): grow partial derivations of the target on the worker pool, one
//!   open ingredient per expansion, shallowest first.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::catalog::registry::Registry;
use crate::codec::{build_tree, check_tree, is_structural_duplicate, Assignment, StepKey};
use crate::core::element::{ElementId, Recipe, RecipeStep};
use crate::search::limits::Budget;
use crate::search::queue::PrunedQueue;
use crate::search::{BfsMode, SearchContext, Strategy};

#[derive(Debug, Clone, Copy, Default)]
pub struct BreadthFirst;

impl Strategy for BreadthFirst {
    fn name(&self) -> &'static str {
        "bfs"
    }

    fn search(&self, ctx: &SearchContext<'_>) {
        let mode = ctx.options.bfs_mode.resolve(ctx.max_results);
        tracing::debug!(target_name = ctx.target_name(), %mode, "bfs start");
        match mode {
            BfsMode::Shortest => search_paths(ctx, 1),
            BfsMode::Paths => search_paths(ctx, ctx.max_results),
            BfsMode::Trees | BfsMode::Auto => search_trees(ctx),
        }
    }
}

// ---------------------------------------------------------------------------------------------
// Path search
// ---------------------------------------------------------------------------------------------

fn search_paths(ctx: &SearchContext<'_>, max_paths: usize) {
    let paths = find_paths(ctx.registry, ctx.target, max_paths, ctx.budget);
    tracing::debug!(paths = paths.len(), "bfs paths found");

    for path in &paths {
        if ctx.collector.is_full() {
            break;
        }
        let mut assignment = path_assignment(ctx.registry, path);
        if ctx.options.expand_to_basics {
            complete_assignment(ctx.registry, ctx.target, &mut assignment);
        }
        let tree = build_tree(ctx.registry, ctx.target, &assignment);
        if let Err(violation) = check_tree(ctx.registry, &tree, !ctx.options.expand_to_basics) {
            tracing::trace!(?violation, "discarding path derivation");
            continue;
        }
        ctx.accept(tree);
    }
}

/// Forward BFS over element paths starting at every primitive.
///
/// A node is expanded at most `max_paths` times, so `max_paths == 1` is a plain shortest-path
/// search. The queue is bounded by `max_queue_size`; overflow drops the newest (deepest) paths.
pub fn find_paths(
    reg: &Registry,
    target: ElementId,
    max_paths: usize,
    budget: &Budget,
) -> Vec<Vec<ElementId>> {
    let mut out: Vec<Vec<ElementId>> = Vec::new();
    if max_paths == 0 {
        return out;
    }
    let cap = budget.limits().max_queue_size.max(1);
    let target_tier = reg.tier(target);

    let mut queue: VecDeque<Vec<ElementId>> =
        reg.primitives().iter().map(|&p| vec![p]).collect();
    let mut visits: FxHashMap<ElementId, usize> = FxHashMap::default();

    while let Some(path) = queue.pop_front() {
        if out.len() >= max_paths || !budget.try_expand("bfs_paths") {
            break;
        }
        let Some(&node) = path.last() else {
            continue;
        };
        let seen = visits.entry(node).or_insert(0);
        if *seen >= max_paths {
            continue;
        }
        *seen += 1;
        budget.visit(1);

        if node == target {
            out.push(path);
            continue;
        }
        if !budget.allow_depth("bfs_paths", path.len()) {
            continue;
        }

        for &p in reg.products_of(node) {
            if path.contains(&p) {
                continue;
            }
            // Tiers strictly increase along a path, so nothing at or above the target's tier
            // (other than the target) can lead to it.
            if p != target {
                if let (Some(tp), Some(tt)) = (reg.tier(p), target_tier) {
                    if tp >= tt {
                        continue;
                    }
                }
            }
            let mut next = Vec::with_capacity(path.len() + 1);
            next.extend_from_slice(&path);
            next.push(p);
            queue.push_back(next);
            if queue.len() > cap {
                queue.pop_back();
                budget.note_evicted(1);
            }
        }
    }
    out
}

/// Assign each path element a valid recipe that uses its predecessor.
pub fn path_assignment(reg: &Registry, path: &[ElementId]) -> Assignment {
    let mut assignment = Assignment::default();
    for w in path.windows(2) {
        let (prev, cur) = (w[0], w[1]);
        if assignment.contains_key(&cur) {
            continue;
        }
        if let Some(r) = reg.valid_recipes(cur).find(|r| r.uses(prev)) {
            assignment.insert(cur, r);
        }
    }
    assignment
}

/// Fill in every unassigned, non-primitive element reachable from `target` with its simplest
/// valid recipe (lowest ingredient tiers, catalog order on ties).
pub fn complete_assignment(reg: &Registry, target: ElementId, assignment: &mut Assignment) {
    let mut queue = VecDeque::from([target]);
    let mut seen: FxHashSet<ElementId> = FxHashSet::default();
    seen.insert(target);

    while let Some(id) = queue.pop_front() {
        if reg.is_primitive_id(id) {
            continue;
        }
        let recipe = match assignment.get(&id) {
            Some(r) => *r,
            None => match simplest_recipe(reg, id) {
                Some(r) => {
                    assignment.insert(id, r);
                    r
                }
                None => continue,
            },
        };
        for ing in recipe.ingredients() {
            if seen.insert(ing) {
                queue.push_back(ing);
            }
        }
    }
}

fn simplest_recipe(reg: &Registry, id: ElementId) -> Option<Recipe> {
    reg.valid_recipes(id).min_by_key(|r| {
        let rank = |e: ElementId| reg.tier(e).unwrap_or(u32::MAX);
        rank(r.a).max(rank(r.b))
    })
}

// ---------------------------------------------------------------------------------------------
// Open-set search
// ---------------------------------------------------------------------------------------------

/// A partial derivation of the target.
#[derive(Debug, Clone)]
struct BuildItem {
    /// Chosen recipes, sorted by product.
    steps: Vec<RecipeStep>,
    /// Elements still needing a recipe with their level below the target, sorted by expansion
    /// priority (last = next).
    open: Vec<(ElementId, usize)>,
    /// Number of recipes chosen so far. Queued items always have a non-empty open set, so an
    /// item at depth `d` completes trees with at least `d + 1` steps.
    depth: usize,
}

impl BuildItem {
    fn is_assigned(&self, id: ElementId) -> bool {
        self.steps
            .binary_search_by_key(&id, |s| s.product)
            .is_ok()
    }

    fn assign(&mut self, step: RecipeStep) {
        if let Err(at) = self.steps.binary_search_by_key(&step.product, |s| s.product) {
            self.steps.insert(at, step);
        }
    }

    /// Open `id` unless it is open already. Higher (tier, id) pairs are expanded first.
    fn push_open(&mut self, reg: &Registry, id: ElementId, level: usize) {
        let key = |e: ElementId| (reg.tier(e).unwrap_or(u32::MAX), e);
        if let Err(at) = self.open.binary_search_by_key(&key(id), |&(e, _)| key(e)) {
            self.open.insert(at, (id, level));
        }
    }

    fn assignment(&self) -> Assignment {
        self.steps.iter().map(|s| (s.product, s.recipe)).collect()
    }
}

/// Open-set items that are queued or being expanded, counted per depth.
///
/// Evicted items are never retired, which only keeps the lower bound lower than it could be.
#[derive(Default)]
struct LiveDepths {
    counts: Mutex<BTreeMap<usize, usize>>,
}

impl LiveDepths {
    fn add(&self, depth: usize) {
        *self.counts.lock().entry(depth).or_insert(0) += 1;
    }

    /// Register the children of an expanded item, then retire it. Returns the shallowest depth
    /// still live.
    fn retire(&self, depth: usize, children: impl Iterator<Item = usize>) -> Option<usize> {
        let mut counts = self.counts.lock();
        for d in children {
            *counts.entry(d).or_insert(0) += 1;
        }
        if let Some(n) = counts.get_mut(&depth) {
            *n -= 1;
            if *n == 0 {
                counts.remove(&depth);
            }
        }
        counts.keys().next().copied()
    }
}

/// Workers finish trees in scheduling order, so the collector is held open and keeps the
/// smallest trees by (steps, signature). It is sealed once no live item can produce a tree that
/// would still make the cut, which keeps the result set independent of the worker count.
fn search_trees(ctx: &SearchContext<'_>) {
    let reg = ctx.registry;
    if reg.valid_recipes(ctx.target).next().is_none() {
        return;
    }
    ctx.collector.hold_open();

    let queue: PrunedQueue<BuildItem> = PrunedQueue::new(ctx.budget.limits().max_queue_size);
    let seen_steps: Mutex<FxHashSet<StepKey>> = Mutex::new(FxHashSet::default());
    let deepest = AtomicUsize::new(0);
    let live = LiveDepths::default();

    live.add(0);
    queue.push(
        0,
        BuildItem {
            steps: Vec::new(),
            open: vec![(ctx.target, 0)],
            depth: 0,
        },
    );

    ctx.pool.run(&queue, ctx.collector, ctx.budget, |item, out| {
        let depth = item.depth;
        let before = out.len();
        expand_item(ctx, item, out, &seen_steps, &deepest);
        let shallowest = live.retire(depth, out[before..].iter().map(|(d, _)| *d));
        ctx.collector.settle(shallowest.map(|d| d + 1));
    });
    ctx.announce_results();

    tracing::debug!(
        nodes_visited = ctx.budget.nodes_visited(),
        evicted = ctx.budget.evicted(),
        "bfs trees done"
    );
}

fn expand_item(
    ctx: &SearchContext<'_>,
    mut item: BuildItem,
    out: &mut Vec<(usize, BuildItem)>,
    seen_steps: &Mutex<FxHashSet<StepKey>>,
    deepest: &AtomicUsize,
) {
    let reg = ctx.registry;
    if !ctx.budget.try_expand("bfs_trees") {
        return;
    }
    ctx.budget.visit(1);

    let Some((id, level)) = item.open.pop() else {
        finish_item(ctx, &item, seen_steps);
        return;
    };
    // The chosen recipe puts its ingredients one level further down.
    if !ctx.budget.allow_depth("bfs_trees", level + 1) {
        return;
    }
    let depth = item.depth + 1;
    if deepest.fetch_max(depth, Ordering::Relaxed) < depth && ctx.events.is_enabled() {
        let partial = build_tree(reg, ctx.target, &item.assignment());
        ctx.preview(format!("exploring derivations with {depth} steps"), Some(partial));
    }

    let before = out.len();
    'recipes: for recipe in reg.valid_recipes(id) {
        if ctx.collector.is_full() {
            break;
        }
        let mut child = BuildItem {
            steps: item.steps.clone(),
            open: item.open.clone(),
            depth,
        };
        child.assign(RecipeStep::new(id, recipe));

        for ing in recipe.ingredients() {
            if reg.is_primitive_id(ing) || child.is_assigned(ing) {
                continue;
            }
            if reg.valid_recipes(ing).next().is_none() {
                continue 'recipes;
            }
            child.push_open(reg, ing, level + 1);
        }

        if child.open.is_empty() {
            finish_item(ctx, &child, seen_steps);
        } else {
            out.push((depth, child));
        }
    }
    tracing::trace!(element = %id, depth, children = out.len() - before, "expanded");
}

fn finish_item(ctx: &SearchContext<'_>, item: &BuildItem, seen_steps: &Mutex<FxHashSet<StepKey>>) {
    if is_structural_duplicate(ctx.registry, &item.steps, &mut seen_steps.lock()) {
        return;
    }
    let tree = build_tree(ctx.registry, ctx.target, &item.assignment());
    // Only reachable when untiered recipes are admitted: a reused assignment closed a cycle.
    if let Err(violation) = check_tree(ctx.registry, &tree, false) {
        tracing::trace!(?violation, "discarding cyclic derivation");
        return;
    }
    ctx.accept_ranked(item.steps.len(), tree);
}
