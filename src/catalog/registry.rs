//! The element registry: an immutable, case-insensitive view of the recipe graph.
//!
//! Building the registry is the only place where catalog noise is handled. Duplicate element
//! records, recipes naming unknown ingredients and recipes declared on primitives are dropped
//! with a log line and counted in [`RegistryStats`]; none of them is fatal. After `build` the
//! registry is read-only and shared between search threads without locking.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::catalog::tiers::compute_tiers;
use crate::catalog::RawElement;
use crate::core::element::{Element, ElementId, Recipe, Tier};
use crate::core::name::{capitalize, normalize};
use crate::error::SearchError;

/// Where element tiers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierSource {
    /// Fixed-point pass from the primitives (ignores catalog tiers).
    #[default]
    Compute,
    /// Trust the `tier` field of each record.
    Catalog,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOptions {
    /// Primitive element names (tier 0, never have recipes).
    pub primitives: Vec<String>,
    pub tiers: TierSource,
    /// Admit recipes touching untiered elements. Strategies then rely on their visiting guards
    /// to stay finite.
    pub admit_untiered: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            primitives: DEFAULT_PRIMITIVES.iter().map(|s| s.to_string()).collect(),
            tiers: TierSource::Compute,
            admit_untiered: false,
        }
    }
}

pub const DEFAULT_PRIMITIVES: &[&str] = &["air", "earth", "fire", "water"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub elements: usize,
    pub primitives: usize,
    pub recipes: usize,
    pub valid_recipes: usize,
    pub dropped_duplicate_elements: usize,
    pub dropped_unknown_ingredients: usize,
    pub dropped_primitive_recipes: usize,
    pub untiered_elements: usize,
}

#[derive(Debug, Clone)]
pub struct Registry {
    elements: Vec<Element>,
    by_key: FxHashMap<String, ElementId>,
    /// Products whose valid recipes use the indexed element, sorted by id.
    products: Vec<Vec<ElementId>>,
    primitives: Vec<ElementId>,
    admit_untiered: bool,
    stats: RegistryStats,
}

impl Registry {
    pub fn build(raw: Vec<RawElement>, options: &RegistryOptions) -> Result<Self, SearchError> {
        if raw.is_empty() {
            return Err(SearchError::catalog("catalog has no elements"));
        }

        let primitive_keys: FxHashSet<String> = options
            .primitives
            .iter()
            .map(|p| normalize(p))
            .filter(|p| !p.is_empty())
            .collect();
        if primitive_keys.is_empty() {
            return Err(SearchError::catalog("primitive set is empty"));
        }

        let mut stats = RegistryStats::default();
        let mut elements: Vec<Element> = Vec::with_capacity(raw.len() + primitive_keys.len());
        let mut by_key: FxHashMap<String, ElementId> = FxHashMap::default();
        let mut pending: Vec<(Vec<(String, String)>, Option<i64>)> = Vec::with_capacity(raw.len());

        for rec in raw {
            let key = normalize(&rec.name);
            if key.is_empty() {
                tracing::warn!(name = %rec.name, "dropping catalog element with an empty name");
                continue;
            }
            if by_key.contains_key(&key) {
                tracing::warn!(element = %key, "dropping duplicate catalog element");
                stats.dropped_duplicate_elements += 1;
                continue;
            }
            let id = ElementId::new(elements.len());
            by_key.insert(key.clone(), id);
            elements.push(Element {
                id,
                primitive: primitive_keys.contains(&key),
                display: rec.name.trim().to_string(),
                key,
                tier: None,
                recipes: Vec::new(),
            });
            let pairs = rec.recipes.iter().flat_map(|r| r.pairs()).collect();
            pending.push((pairs, rec.tier));
        }

        // Primitives absent from the catalog still exist as leaves.
        let mut missing: Vec<&String> = primitive_keys
            .iter()
            .filter(|k| !by_key.contains_key(*k))
            .collect();
        missing.sort();
        for key in missing {
            let id = ElementId::new(elements.len());
            by_key.insert(key.clone(), id);
            elements.push(Element {
                id,
                key: key.clone(),
                display: capitalize(key),
                tier: Some(0),
                primitive: true,
                recipes: Vec::new(),
            });
            pending.push((Vec::new(), Some(0)));
        }

        for (idx, (pairs, _)) in pending.iter().enumerate() {
            let product = &elements[idx];
            if product.primitive {
                if !pairs.is_empty() {
                    tracing::warn!(
                        element = %product.key,
                        recipes = pairs.len(),
                        "dropping recipes declared on a primitive"
                    );
                    stats.dropped_primitive_recipes += pairs.len();
                }
                continue;
            }

            let mut seen: FxHashSet<Recipe> = FxHashSet::default();
            let mut recipes = Vec::with_capacity(pairs.len());
            for (x, y) in pairs {
                let (kx, ky) = (normalize(x), normalize(y));
                match (by_key.get(&kx), by_key.get(&ky)) {
                    (Some(&a), Some(&b)) => {
                        let r = Recipe::new(a, b);
                        if seen.insert(r) {
                            recipes.push(r);
                        }
                    }
                    _ => {
                        tracing::debug!(
                            element = %product.key,
                            a = %kx,
                            b = %ky,
                            "dropping recipe with unknown ingredient"
                        );
                        stats.dropped_unknown_ingredients += 1;
                    }
                }
            }
            elements[idx].recipes = recipes;
        }

        let tiers: Vec<Tier> = match options.tiers {
            TierSource::Compute => compute_tiers(&elements),
            TierSource::Catalog => pending
                .iter()
                .zip(elements.iter())
                .map(|((_, tier), e)| {
                    if e.primitive {
                        Some(0)
                    } else {
                        tier.and_then(|t| u32::try_from(t).ok())
                    }
                })
                .collect(),
        };
        for (e, tier) in elements.iter_mut().zip(tiers) {
            e.tier = tier;
        }

        let mut primitives: Vec<ElementId> = elements
            .iter()
            .filter(|e| e.primitive)
            .map(|e| e.id)
            .collect();
        primitives.sort_by(|a, b| elements[a.index()].key.cmp(&elements[b.index()].key));

        let mut reg = Registry {
            products: vec![Vec::new(); elements.len()],
            elements,
            by_key,
            primitives,
            admit_untiered: options.admit_untiered,
            stats,
        };
        reg.index_products();
        reg.stats.elements = reg.elements.len();
        reg.stats.primitives = reg.primitives.len();
        reg.stats.recipes = reg.elements.iter().map(|e| e.recipes.len()).sum();
        reg.stats.untiered_elements = reg.elements.iter().filter(|e| e.tier.is_none()).count();

        tracing::debug!(
            elements = reg.stats.elements,
            recipes = reg.stats.recipes,
            valid_recipes = reg.stats.valid_recipes,
            untiered = reg.stats.untiered_elements,
            "registry built"
        );
        Ok(reg)
    }

    fn index_products(&mut self) {
        let mut valid = 0usize;
        for e in self.elements.iter() {
            for r in e.recipes.iter().copied() {
                if !self.recipe_allowed(e.id, r) {
                    continue;
                }
                valid += 1;
                self.products[r.a.index()].push(e.id);
                if !r.is_doubled() {
                    self.products[r.b.index()].push(e.id);
                }
            }
        }
        for v in self.products.iter_mut() {
            v.sort_unstable();
            v.dedup();
        }
        self.stats.valid_recipes = valid;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> RegistryStats {
        self.stats
    }

    #[inline]
    pub fn admits_untiered(&self) -> bool {
        self.admit_untiered
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&Element> {
        self.id_of(name).map(|id| self.element(id))
    }

    pub fn id_of(&self, name: &str) -> Option<ElementId> {
        self.by_key.get(&normalize(name)).copied()
    }

    #[inline]
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.index()]
    }

    #[inline]
    pub fn tier(&self, id: ElementId) -> Tier {
        self.elements[id.index()].tier
    }

    #[inline]
    pub fn display(&self, id: ElementId) -> &str {
        &self.elements[id.index()].display
    }

    pub fn is_primitive(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|e| e.primitive)
    }

    #[inline]
    pub fn is_primitive_id(&self, id: ElementId) -> bool {
        self.elements[id.index()].primitive
    }

    /// Primitive ids ordered by key.
    pub fn primitives(&self) -> &[ElementId] {
        &self.primitives
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Tier invariant: both ingredients strictly below the product. Unknown tiers are admitted
    /// only when the registry was built with `admit_untiered`. Self-references never are.
    pub fn recipe_allowed(&self, product: ElementId, recipe: Recipe) -> bool {
        if recipe.uses(product) || self.is_primitive_id(product) {
            return false;
        }
        match (self.tier(product), self.tier(recipe.a), self.tier(recipe.b)) {
            (Some(p), Some(a), Some(b)) => a < p && b < p,
            _ => self.admit_untiered,
        }
    }

    /// Recipes of `id` satisfying the tier invariant, in catalog order.
    pub fn valid_recipes(&self, id: ElementId) -> impl Iterator<Item = Recipe> + '_ {
        self.elements[id.index()]
            .recipes
            .iter()
            .copied()
            .filter(move |r| self.recipe_allowed(id, *r))
    }

    /// Elements that have at least one valid recipe using `id`.
    pub fn products_of(&self, id: ElementId) -> &[ElementId] {
        &self.products[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RawRecipe;

    fn opts() -> RegistryOptions {
        RegistryOptions::default()
    }

    #[test]
    fn lookup_is_case_insensitive_and_keeps_catalog_spelling() {
        let reg = Registry::build(
            vec![
                RawElement::new("Earth", &[]),
                RawElement::new("Water", &[]),
                RawElement::new("Mud", &[("earth", "WATER")]),
            ],
            &opts(),
        )
        .unwrap();

        let mud = reg.lookup("  mUD ").unwrap();
        assert_eq!(mud.display, "Mud");
        assert_eq!(mud.tier, Some(1));
        assert_eq!(mud.recipes.len(), 1);
        assert!(reg.is_primitive("EARTH"));
        // "air" and "fire" were not in the catalog but are primitives.
        assert!(reg.lookup("fire").is_some_and(|e| e.primitive));
    }

    #[test]
    fn duplicates_and_unknown_ingredients_are_dropped_not_fatal() {
        let reg = Registry::build(
            vec![
                RawElement::new("Mud", &[("earth", "water"), ("water", "earth")]),
                RawElement::new("mud", &[("fire", "fire")]),
                RawElement::new("Brick", &[("mud", "fire"), ("mud", "unobtainium")]),
            ],
            &opts(),
        )
        .unwrap();

        let stats = reg.stats();
        assert_eq!(stats.dropped_duplicate_elements, 1);
        assert_eq!(stats.dropped_unknown_ingredients, 1);
        assert_eq!(reg.lookup("mud").unwrap().recipes.len(), 1);
        assert_eq!(reg.lookup("brick").unwrap().recipes.len(), 1);
    }

    #[test]
    fn recipes_on_primitives_are_ignored() {
        let reg = Registry::build(
            vec![RawElement::new("Fire", &[("air", "earth")])],
            &opts(),
        )
        .unwrap();
        assert!(!reg.lookup("fire").unwrap().has_recipes());
        assert_eq!(reg.stats().dropped_primitive_recipes, 1);
    }

    #[test]
    fn expression_recipes_are_expanded() {
        let raw = vec![RawElement {
            name: "Steam".to_string(),
            recipes: vec![RawRecipe::List(vec![
                "Steam".to_string(),
                "Water + Fire\nAir + Fire\nbroken line".to_string(),
            ])],
            tier: None,
        }];
        let reg = Registry::build(raw, &opts()).unwrap();
        assert_eq!(reg.lookup("steam").unwrap().recipes.len(), 2);
    }

    #[test]
    fn empty_catalog_is_a_catalog_error() {
        let err = Registry::build(Vec::new(), &opts()).unwrap_err();
        assert!(matches!(err, SearchError::Catalog { .. }));
    }

    #[test]
    fn products_index_only_lists_valid_recipes() {
        let reg = Registry::build(
            vec![
                RawElement::new("Mud", &[("earth", "water")]),
                // Violates the tier invariant once tiers are trusted from the catalog.
                RawElement::new("Clay", &[("mud", "fire")]).with_tier(1),
            ],
            &RegistryOptions {
                tiers: TierSource::Catalog,
                ..opts()
            },
        )
        .unwrap();
        let mud = reg.id_of("mud").unwrap();
        // Mud has no catalog tier, so it is unknown and excluded without admit_untiered.
        assert!(reg.products_of(mud).is_empty());
        let earth = reg.id_of("earth").unwrap();
        assert!(reg.products_of(earth).is_empty());
    }
}
