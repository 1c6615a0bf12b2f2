//! Memoized backward search.
//!
//! `resolve(e)` returns the distinct derivation trees of `e`, built bottom-up from the
//! alternatives of its ingredients and cached per search. The two ingredients of a recipe are
//! resolved concurrently with `rayon::join` when the request allows it.
//!
//! Cycles (only possible when untiered recipes are admitted) are cut by the ancestor chain of the
//! current branch: re-entering an ancestor is a dead end.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::element::ElementId;
use crate::search::{combine_pairs, Alternatives, SearchContext, Strategy};

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoizedDfs;

impl Strategy for MemoizedDfs {
    fn name(&self) -> &'static str {
        "dfs"
    }

    fn search(&self, ctx: &SearchContext<'_>) {
        if !ctx.registry.element(ctx.target).has_recipes() {
            return;
        }
        let factor = ctx.budget.limits().dfs_intermediate_factor.max(1);
        let resolver = Resolver {
            ctx,
            cache: Mutex::new(FxHashMap::default()),
            target_cap: ctx.max_results,
            intermediate_cap: ctx.max_results.saturating_mul(factor),
        };
        let found = resolver.resolve(ctx.target, None);
        tracing::debug!(
            alternatives = found.len(),
            cached = resolver.cache.lock().len(),
            "dfs resolved target"
        );

        for (tree, sig) in found.iter() {
            if ctx.collector.is_full() {
                break;
            }
            ctx.accept_signed(sig.to_string(), tree.clone());
        }
    }
}

/// Link in the chain of elements currently being resolved on one branch.
struct Ancestor<'c> {
    id: ElementId,
    depth: usize,
    parent: Option<&'c Ancestor<'c>>,
}

impl Ancestor<'_> {
    fn contains(&self, id: ElementId) -> bool {
        let mut cur = Some(self);
        while let Some(link) = cur {
            if link.id == id {
                return true;
            }
            cur = link.parent;
        }
        false
    }
}

struct Resolver<'a> {
    ctx: &'a SearchContext<'a>,
    cache: Mutex<FxHashMap<ElementId, Arc<Alternatives>>>,
    target_cap: usize,
    intermediate_cap: usize,
}

impl Resolver<'_> {
    fn resolve(&self, id: ElementId, chain: Option<&Ancestor<'_>>) -> Arc<Alternatives> {
        if let Some(hit) = self.cache.lock().get(&id) {
            return Arc::clone(hit);
        }
        if chain.is_some_and(|c| c.contains(id)) {
            return Arc::new(Alternatives::default());
        }

        let ctx = self.ctx;
        let reg = ctx.registry;
        let depth = chain.map_or(0, |c| c.depth + 1);
        ctx.budget.visit(1);

        if !ctx.budget.allow_depth("dfs", depth) {
            return Arc::new(Alternatives::default());
        }
        if reg.is_primitive_id(id) {
            return self.store(id, Alternatives::leaf(reg.display(id)));
        }

        let cap = if id == ctx.target {
            self.target_cap
        } else {
            self.intermediate_cap
        };
        let link = Ancestor {
            id,
            depth,
            parent: chain,
        };
        let name = reg.display(id);
        let mut acc = Alternatives::default();
        let mut fresh = Vec::new();
        let mut truncated = false;

        for recipe in reg.valid_recipes(id) {
            if acc.len() >= cap || ctx.collector.is_full() {
                break;
            }
            if !ctx.budget.try_expand("dfs") {
                truncated = true;
                break;
            }

            let (left, right) = if ctx.options.parallel && !recipe.is_doubled() {
                rayon::join(
                    || self.resolve(recipe.a, Some(&link)),
                    || self.resolve(recipe.b, Some(&link)),
                )
            } else {
                let left = self.resolve(recipe.a, Some(&link));
                let right = if recipe.is_doubled() {
                    Arc::clone(&left)
                } else {
                    self.resolve(recipe.b, Some(&link))
                };
                (left, right)
            };
            if left.is_empty() || right.is_empty() {
                continue;
            }

            fresh.clear();
            let mut local: FxHashSet<String> = FxHashSet::default();
            combine_pairs(
                name,
                &left,
                &right,
                cap - acc.len(),
                |sig| !acc.contains(sig) && local.insert(sig.to_string()),
                &mut fresh,
            );
            for (sig, tree) in fresh.drain(..) {
                acc.push(sig, tree);
            }
        }

        if truncated && acc.is_empty() {
            return Arc::new(acc);
        }
        if id != ctx.target && ctx.events.is_enabled() {
            if let Some(first) = acc.first() {
                ctx.preview(
                    format!("resolved {name}: {} alternatives", acc.len()),
                    Some(first.clone()),
                );
            }
        }
        tracing::trace!(element = %id, alternatives = acc.len(), "resolved");
        self.store(id, acc)
    }

    /// First insert wins when two branches raced on the same element.
    fn store(&self, id: ElementId, alts: Alternatives) -> Arc<Alternatives> {
        let mut cache = self.cache.lock();
        Arc::clone(cache.entry(id).or_insert_with(|| Arc::new(alts)))
    }
}
