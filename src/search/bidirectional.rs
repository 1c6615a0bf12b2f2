//! Bidirectional layered search.
//!
//! The forward side grows derivation trees upward from the primitives, one layer per round: an
//! element joins layer `d + 1` once one of its valid recipes has both ingredients at layer `<= d`.
//! The backward side walks down from the target through recipe ingredients and marks every
//! element that can appear in a derivation of it. Forward trees of the target are the results;
//! elements reached by both sides are reported as meeting points.
//!
//! Once the backward side stops growing, the forward side only works on backward-reached
//! elements, since nothing else can end up in a derivation of the target.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::catalog::registry::Registry;
use crate::codec::check_tree;
use crate::core::element::ElementId;
use crate::core::tree::DerivationTree;
use crate::search::{combine_pairs, Alternatives, SearchContext, Strategy};

#[derive(Debug, Clone, Copy, Default)]
pub struct Bidirectional;

impl Strategy for Bidirectional {
    fn name(&self) -> &'static str {
        "bidirectional"
    }

    fn search(&self, ctx: &SearchContext<'_>) {
        let mut state = Frontiers::new(ctx);
        let max_depth = ctx.budget.limits().max_depth;
        let mut forward_done = false;
        let mut backward_done = false;

        for round in 0.. {
            if ctx.should_stop() || (forward_done && backward_done) {
                break;
            }
            if round >= max_depth {
                // Record the cut only when there was still something to do.
                ctx.budget.allow_depth("bidirectional", round + 1);
                break;
            }
            if !ctx.budget.try_expand("bidirectional") {
                break;
            }
            if !forward_done {
                forward_done = !state.expand_forward(ctx, backward_done);
            }
            if ctx.collector.is_full() {
                break;
            }
            if !backward_done {
                backward_done = !state.expand_backward(ctx);
            }
        }

        tracing::debug!(
            forward = state.forward.len(),
            backward = state.backward.len(),
            forward_layer = state.forward_layer,
            backward_layer = state.backward_layer,
            "bidirectional done"
        );
    }
}

struct Frontiers {
    target: ElementId,
    /// Forward trees per element.
    forward: FxHashMap<ElementId, Alternatives>,
    /// First forward layer of every forward-reached element.
    forward_depth: FxHashMap<ElementId, usize>,
    forward_layer: usize,
    /// First backward layer of every backward-reached element.
    backward: FxHashMap<ElementId, usize>,
    backward_frontier: Vec<ElementId>,
    backward_layer: usize,
}

impl Frontiers {
    fn new(ctx: &SearchContext<'_>) -> Self {
        let reg = ctx.registry;
        let mut forward = FxHashMap::default();
        let mut forward_depth = FxHashMap::default();
        for &p in reg.primitives() {
            forward.insert(p, Alternatives::leaf(reg.display(p)));
            forward_depth.insert(p, 0);
        }
        ctx.budget.visit(reg.primitives().len() as u64 + 1);

        let mut backward = FxHashMap::default();
        backward.insert(ctx.target, 0);

        Self {
            target: ctx.target,
            forward,
            forward_depth,
            forward_layer: 0,
            backward,
            backward_frontier: vec![ctx.target],
            backward_layer: 0,
        }
    }

    fn cap(&self, ctx: &SearchContext<'_>, id: ElementId) -> usize {
        if id == self.target {
            ctx.max_results
        } else {
            ctx.options.max_recipes_per_element.max(1)
        }
    }

    /// Whether `id` can still matter for the target.
    fn relevant(&self, reg: &Registry, id: ElementId, restrict: bool) -> bool {
        if reg.is_primitive_id(id) {
            return false;
        }
        if restrict {
            return self.backward.contains_key(&id);
        }
        if id == self.target {
            return true;
        }
        match (reg.tier(id), reg.tier(self.target)) {
            (Some(t), Some(tt)) => t < tt,
            _ => true,
        }
    }

    /// One forward layer. Returns whether any element gained a tree.
    fn expand_forward(&mut self, ctx: &SearchContext<'_>, restrict: bool) -> bool {
        let reg = ctx.registry;
        let layer = self.forward_layer;

        let candidates: Vec<ElementId> = reg
            .elements()
            .iter()
            .map(|e| e.id)
            .filter(|&id| self.relevant(reg, id, restrict))
            .filter(|&id| self.forward.get(&id).map_or(0, Alternatives::len) < self.cap(ctx, id))
            .collect();

        let this = &*self;
        let computed = ctx.pool.map(&candidates, |&id| this.new_trees(ctx, id, layer));

        let mut grew = false;
        for (id, trees) in candidates.into_iter().zip(computed) {
            if trees.is_empty() {
                continue;
            }
            grew = true;
            let newly_reached = !self.forward_depth.contains_key(&id);
            if newly_reached {
                self.forward_depth.insert(id, layer + 1);
                ctx.budget.visit(1);
            }

            if id == self.target {
                for (sig, tree) in &trees {
                    if ctx.collector.is_full() {
                        break;
                    }
                    // Untiered recipes can re-use an element below itself.
                    if reg.admits_untiered() && check_tree(reg, tree, false).is_err() {
                        continue;
                    }
                    ctx.accept_signed(sig.clone(), tree.clone());
                }
            } else if newly_reached && self.backward.contains_key(&id) {
                self.meeting_point(ctx, id, trees.first().map(|(_, t)| t));
            }

            let alts = self.forward.entry(id).or_default();
            for (sig, tree) in trees {
                alts.push(sig, tree);
            }
        }

        if grew {
            self.forward_layer += 1;
        }
        tracing::trace!(layer, grew, "forward layer");
        grew
    }

    /// Trees of `id` not held yet, from recipes whose ingredients both sit at layer `<= layer`.
    fn new_trees(
        &self,
        ctx: &SearchContext<'_>,
        id: ElementId,
        layer: usize,
    ) -> Vec<(String, DerivationTree)> {
        let reg = ctx.registry;
        let held = self.forward.get(&id);
        let slots = self.cap(ctx, id) - held.map_or(0, Alternatives::len);
        let name = reg.display(id);
        let mut out = Vec::new();
        let mut produced: FxHashSet<String> = FxHashSet::default();

        for recipe in reg.valid_recipes(id) {
            if out.len() >= slots {
                break;
            }
            let within = |e: ElementId| self.forward_depth.get(&e).is_some_and(|&d| d <= layer);
            if !within(recipe.a) || !within(recipe.b) {
                continue;
            }
            let (Some(left), Some(right)) = (self.forward.get(&recipe.a), self.forward.get(&recipe.b))
            else {
                continue;
            };
            combine_pairs(
                name,
                left,
                right,
                slots - out.len(),
                |sig| !held.is_some_and(|h| h.contains(sig)) && produced.insert(sig.to_string()),
                &mut out,
            );
        }
        out
    }

    /// One backward layer. Returns whether any new element was reached.
    fn expand_backward(&mut self, ctx: &SearchContext<'_>) -> bool {
        let reg = ctx.registry;
        let layer = self.backward_layer;
        let mut next = Vec::new();

        for &id in &self.backward_frontier {
            for recipe in reg.valid_recipes(id) {
                for ing in recipe.ingredients() {
                    if self.backward.contains_key(&ing) {
                        continue;
                    }
                    self.backward.insert(ing, layer + 1);
                    next.push(ing);
                }
            }
        }
        next.sort_unstable();
        ctx.budget.visit(next.len() as u64);

        for &id in &next {
            if !reg.is_primitive_id(id) {
                if let Some(alts) = self.forward.get(&id) {
                    self.meeting_point(ctx, id, alts.first());
                }
            }
        }

        let grew = !next.is_empty();
        self.backward_frontier = next;
        if grew {
            self.backward_layer += 1;
        }
        tracing::trace!(layer, grew, "backward layer");
        grew
    }

    fn meeting_point(&self, ctx: &SearchContext<'_>, id: ElementId, tree: Option<&DerivationTree>) {
        if ctx.events.is_enabled() {
            ctx.preview(
                format!("both directions meet at {}", ctx.registry.display(id)),
                tree.cloned(),
            );
        }
    }
}
