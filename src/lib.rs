//! Enumerate derivation trees in two-ingredient combination games.
//!
//! Starting from a handful of primitive elements, every other element is made by combining two
//! ingredients. Given a catalog of recipes and a target, the engine finds distinct ways to build
//! the target from the primitives, using breadth-first, memoized depth-first or bidirectional
//! search.
//!
//! ```no_run
//! use std::sync::Arc;
//! use recipe_search::catalog::registry::{Registry, RegistryOptions};
//! use recipe_search::engine::{Algorithm, Engine, EngineConfig, SearchRequest};
//!
//! let registry = Registry::build(recipe_search::catalogs::brick(), &RegistryOptions::default())?;
//! let engine = Engine::new(Arc::new(registry), EngineConfig::default());
//! let outcome = engine.search(&SearchRequest::new("brick", Algorithm::Dfs, 3))?;
//! println!("{}", serde_json::to_string_pretty(&outcome.trees).unwrap());
//! # Ok::<(), recipe_search::error::SearchError>(())
//! ```

pub mod catalog;
pub mod catalogs;
pub mod codec;
pub mod core;
pub mod engine;
pub mod error;
pub mod export;
pub mod search;
