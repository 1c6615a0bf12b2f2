//! Tier computation and tier statistics.
//!
//! `tier(e) = 1 + min over recipes (a, b) of max(tier(a), tier(b))`, with primitives at 0.
//! The pass assigns tiers layer by layer, so every element derivable from the primitives gets the
//! smallest such value and everything else (including mutually recursive pairs) stays `None`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::registry::Registry;
use crate::core::element::{Element, Tier};

pub fn compute_tiers(elements: &[Element]) -> Vec<Tier> {
    let mut tiers: Vec<Tier> = elements
        .iter()
        .map(|e| if e.primitive { Some(0) } else { None })
        .collect();

    let mut level: u32 = 0;
    loop {
        level += 1;
        let newly: Vec<usize> = elements
            .iter()
            .enumerate()
            .filter(|(i, e)| tiers[*i].is_none() && !e.primitive)
            .filter(|(_, e)| {
                e.recipes.iter().any(|r| {
                    !r.uses(e.id) && tiers[r.a.index()].is_some() && tiers[r.b.index()].is_some()
                })
            })
            .map(|(i, _)| i)
            .collect();

        if newly.is_empty() {
            break;
        }
        for i in newly {
            tiers[i] = Some(level);
        }
    }

    tiers
}

/// Tier distribution of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierReport {
    pub by_tier: BTreeMap<u32, usize>,
    pub unresolved: usize,
    /// Untiered elements that declare no recipe at all (often dangling scrape entries).
    pub unresolved_without_recipes: usize,
    pub max_tier: Option<u32>,
}

pub fn tier_report(reg: &Registry) -> TierReport {
    let mut by_tier: BTreeMap<u32, usize> = BTreeMap::new();
    let mut unresolved = 0;
    let mut unresolved_without_recipes = 0;

    for e in reg.elements() {
        match e.tier {
            Some(t) => *by_tier.entry(t).or_insert(0) += 1,
            None => {
                unresolved += 1;
                if !e.has_recipes() {
                    unresolved_without_recipes += 1;
                }
            }
        }
    }

    TierReport {
        max_tier: by_tier.keys().next_back().copied(),
        by_tier,
        unresolved,
        unresolved_without_recipes,
    }
}
