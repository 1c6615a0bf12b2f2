//! Tree codec: assignments → trees, canonical signatures, and structural checks.
//!
//! A signature is `N<name>` for a leaf and `N<name>C<sig,sig>` for a combination, with the two
//! child signatures sorted, so `brick{mud, fire}` and `brick{fire, mud}` share one signature.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::catalog::registry::Registry;
use crate::core::element::{ElementId, Recipe, RecipeStep};
use crate::core::tree::DerivationTree;

/// One chosen recipe per element of a (partial) derivation.
pub type Assignment = FxHashMap<ElementId, Recipe>;

/// Expand `target` through `assignment` into a tree.
///
/// Elements without an assigned recipe become leaves. Re-entering an element that is still being
/// expanded yields a childless placeholder, so a malformed (cyclic) assignment terminates.
/// Each subtree is built once per call.
pub fn build_tree(reg: &Registry, target: ElementId, assignment: &Assignment) -> DerivationTree {
    let mut visiting: FxHashSet<ElementId> = FxHashSet::default();
    let mut memo: FxHashMap<ElementId, DerivationTree> = FxHashMap::default();
    build_rec(reg, target, assignment, &mut visiting, &mut memo)
}

fn build_rec(
    reg: &Registry,
    id: ElementId,
    assignment: &Assignment,
    visiting: &mut FxHashSet<ElementId>,
    memo: &mut FxHashMap<ElementId, DerivationTree>,
) -> DerivationTree {
    if visiting.contains(&id) {
        return DerivationTree::leaf(reg.display(id));
    }
    if let Some(t) = memo.get(&id) {
        return t.clone();
    }

    let recipe = match assignment.get(&id) {
        Some(r) if !reg.is_primitive_id(id) => *r,
        _ => {
            let leaf = DerivationTree::leaf(reg.display(id));
            memo.insert(id, leaf.clone());
            return leaf;
        }
    };

    visiting.insert(id);
    let left = build_rec(reg, recipe.a, assignment, visiting, memo);
    let right = build_rec(reg, recipe.b, assignment, visiting, memo);
    visiting.remove(&id);

    let node = DerivationTree::combine(reg.display(id), left, right);
    memo.insert(id, node.clone());
    node
}

/// Signature of a node given its name and its children's signatures.
pub fn node_signature(name: &str, mut children: Vec<String>) -> String {
    let cap = name.len() + 3 + children.iter().map(|c| c.len() + 1).sum::<usize>() + 3;
    let mut s = String::with_capacity(cap);
    s.push_str("N<");
    s.push_str(name);
    s.push('>');
    if !children.is_empty() {
        children.sort_unstable();
        s.push_str("C<");
        s.push_str(&children.join(","));
        s.push('>');
    }
    s
}

/// Order-independent signature of a whole tree.
pub fn canonicalize(tree: &DerivationTree) -> String {
    let children = tree.children.iter().map(canonicalize).collect();
    node_signature(&tree.name, children)
}

pub fn count_unique_trees(trees: &[DerivationTree]) -> usize {
    trees
        .iter()
        .map(canonicalize)
        .collect::<FxHashSet<String>>()
        .len()
}

/// Normalized key of a step list: each step annotated with its product tier, sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepKey(String);

impl StepKey {
    pub fn new(reg: &Registry, steps: &[RecipeStep]) -> Self {
        let mut parts: Vec<(Option<u32>, &str, &str, &str)> = steps
            .iter()
            .map(|s| {
                let (x, y) = (
                    reg.element(s.recipe.a).key.as_str(),
                    reg.element(s.recipe.b).key.as_str(),
                );
                let (x, y) = if x <= y { (x, y) } else { (y, x) };
                (reg.tier(s.product), reg.element(s.product).key.as_str(), x, y)
            })
            .collect();
        parts.sort_unstable();
        parts.dedup();

        let mut out = String::new();
        for (tier, p, a, b) in parts {
            match tier {
                Some(t) => out.push_str(&t.to_string()),
                None => out.push('?'),
            }
            out.push(':');
            out.push_str(p);
            out.push('=');
            out.push_str(a);
            out.push('+');
            out.push_str(b);
            out.push(';');
        }
        StepKey(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cheap pre-filter before building a tree: true if an equivalent step list was seen already.
/// Records the key otherwise.
pub fn is_structural_duplicate(
    reg: &Registry,
    steps: &[RecipeStep],
    seen: &mut FxHashSet<StepKey>,
) -> bool {
    !seen.insert(StepKey::new(reg, steps))
}

/// Why a tree is not a valid derivation under a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeViolation {
    UnknownElement(String),
    /// A node with a child count other than 0 or 2.
    Arity { name: String, children: usize },
    /// The two children are not one of the node's declared recipes.
    UndeclaredRecipe { name: String },
    /// An ingredient's tier is not strictly below its product's.
    Tier { name: String },
    /// A leaf that is neither a primitive nor allowed to stay unresolved.
    UnresolvedLeaf { name: String },
    /// An element appears below itself.
    Cycle { name: String },
}

/// Check every node of `tree`: children form a declared, tier-valid recipe and, unless
/// `allow_unresolved_leaves`, every leaf is a primitive.
pub fn check_tree(
    reg: &Registry,
    tree: &DerivationTree,
    allow_unresolved_leaves: bool,
) -> Result<(), TreeViolation> {
    if let Some(name) = repeated_ancestor(tree, &mut Vec::new()) {
        return Err(TreeViolation::Cycle {
            name: name.to_string(),
        });
    }
    for node in tree.iter() {
        let el = reg
            .lookup(&node.name)
            .ok_or_else(|| TreeViolation::UnknownElement(node.name.clone()))?;
        match node.children.as_slice() {
            [] => {
                if !el.primitive && !allow_unresolved_leaves {
                    return Err(TreeViolation::UnresolvedLeaf {
                        name: node.name.clone(),
                    });
                }
            }
            [l, r] => {
                let (a, b) = match (reg.id_of(&l.name), reg.id_of(&r.name)) {
                    (Some(a), Some(b)) => (a, b),
                    _ => return Err(TreeViolation::UnknownElement(node.name.clone())),
                };
                let recipe = Recipe::new(a, b);
                if !el.recipes.contains(&recipe) {
                    return Err(TreeViolation::UndeclaredRecipe {
                        name: node.name.clone(),
                    });
                }
                let tiers_ok = match (el.tier, reg.tier(a), reg.tier(b)) {
                    (Some(p), Some(ta), Some(tb)) => ta < p && tb < p,
                    _ => reg.admits_untiered(),
                };
                if !tiers_ok {
                    return Err(TreeViolation::Tier {
                        name: node.name.clone(),
                    });
                }
            }
            other => {
                return Err(TreeViolation::Arity {
                    name: node.name.clone(),
                    children: other.len(),
                })
            }
        }
    }
    Ok(())
}

fn repeated_ancestor<'t>(node: &'t DerivationTree, path: &mut Vec<&'t str>) -> Option<&'t str> {
    if path.contains(&node.name.as_str()) {
        return Some(node.name.as_str());
    }
    path.push(&node.name);
    for child in &node.children {
        if let Some(name) = repeated_ancestor(child, path) {
            return Some(name);
        }
    }
    path.pop();
    None
}
