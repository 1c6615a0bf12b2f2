//! Catalog input: raw element records and the loaders that produce them.
//!
//! The search core only needs `Vec<RawElement>`; where the records come from (a scraped JSON
//! dump, a built-in demo, a database) is up to the [`CatalogLoader`].
//!
//! Two recipe spellings are accepted because both occur in scraped dumps:
//! - a pair `["Earth", "Water"]`;
//! - an expression string `"Earth + Water"`, possibly several separated by newlines
//!   (also when it appears inside a pair, which is how wiki table cells were exported).

pub mod registry;
pub mod tiers;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRecipe {
    List(Vec<String>),
    Expr(String),
}

impl RawRecipe {
    pub fn pair(a: &str, b: &str) -> Self {
        RawRecipe::List(vec![a.to_string(), b.to_string()])
    }

    /// Expand into trimmed `(ingredient, ingredient)` pairs. Malformed lines are skipped.
    pub fn pairs(&self) -> Vec<(String, String)> {
        match self {
            RawRecipe::List(items) => {
                if let [x, y] = items.as_slice() {
                    if !x.contains('+') && !y.contains('+') {
                        let (x, y) = (x.trim(), y.trim());
                        if x.is_empty() || y.is_empty() {
                            return Vec::new();
                        }
                        return vec![(x.to_string(), y.to_string())];
                    }
                }
                items
                    .iter()
                    .filter(|item| item.contains('+'))
                    .flat_map(|item| parse_expr_lines(item))
                    .collect()
            }
            RawRecipe::Expr(s) => parse_expr_lines(s),
        }
    }
}

fn parse_expr_lines(s: &str) -> Vec<(String, String)> {
    s.lines()
        .filter_map(|line| {
            let mut parts = line.split('+');
            let a = parts.next()?.trim();
            let b = parts.next()?.trim();
            if parts.next().is_some() || a.is_empty() || b.is_empty() {
                return None;
            }
            Some((a.to_string(), b.to_string()))
        })
        .collect()
}

/// One element record as delivered by a loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawElement {
    pub name: String,
    #[serde(default)]
    pub recipes: Vec<RawRecipe>,
    /// Precomputed tier, if the source has one. Negative values mean "unknown".
    #[serde(default)]
    pub tier: Option<i64>,
}

impl RawElement {
    pub fn new(name: &str, recipes: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            recipes: recipes.iter().map(|(a, b)| RawRecipe::pair(a, b)).collect(),
            tier: None,
        }
    }

    pub fn with_tier(mut self, tier: i64) -> Self {
        self.tier = Some(tier);
        self
    }
}

/// Source of raw catalog records.
pub trait CatalogLoader {
    fn load(&self) -> Result<Vec<RawElement>, SearchError>;
}

impl CatalogLoader for Vec<RawElement> {
    fn load(&self) -> Result<Vec<RawElement>, SearchError> {
        Ok(self.clone())
    }
}

/// Loads the scraped `elements.json` format: a JSON array of [`RawElement`].
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogLoader for JsonCatalog {
    fn load(&self) -> Result<Vec<RawElement>, SearchError> {
        let bytes = fs::read(&self.path).map_err(|e| SearchError::Io {
            stage: "catalog_read",
            path: self.path.display().to_string(),
            error: e.to_string(),
        })?;
        parse_catalog_json(&bytes)
    }
}

/// Parse a catalog from JSON bytes.
pub fn parse_catalog_json(bytes: &[u8]) -> Result<Vec<RawElement>, SearchError> {
    serde_json::from_slice(bytes).map_err(|e| SearchError::Json {
        stage: "catalog_parse",
        error: e.to_string(),
    })
}
