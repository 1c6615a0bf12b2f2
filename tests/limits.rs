use std::sync::Arc;

use recipe_search::catalog::registry::{Registry, RegistryOptions};
use recipe_search::catalog::RawElement;
use recipe_search::catalogs;
use recipe_search::engine::{Algorithm, Engine, EngineConfig, SearchRequest};
use recipe_search::search::limits::SearchLimits;
use recipe_search::search::{BfsMode, SearchOptions};

fn engine_with(raw: Vec<RawElement>, limits: SearchLimits) -> Engine {
    let registry = Registry::build(raw, &RegistryOptions::default()).unwrap();
    Engine::new(
        Arc::new(registry),
        EngineConfig {
            limits,
            ..EngineConfig::default()
        },
    )
}

fn trees_mode() -> SearchOptions {
    SearchOptions {
        bfs_mode: BfsMode::Trees,
        ..SearchOptions::default()
    }
}

#[test]
fn shallow_depth_limit_truncates_and_is_reported() {
    let limits = SearchLimits {
        max_depth: 1,
        ..SearchLimits::default()
    };
    let e = engine_with(catalogs::brick(), limits);

    // Every brick derivation has depth 2.
    for algorithm in Algorithm::ALL {
        let request = SearchRequest::new("brick", algorithm, 3).with_options(trees_mode());
        let out = e.search(&request).unwrap();
        assert!(out.trees.is_empty(), "{algorithm}");
        assert!(out.limits_hit.depth, "{algorithm}");
        assert!(!out.limits_hit.results);
    }

    // Depth 1 elements still resolve.
    for algorithm in Algorithm::ALL {
        let out = e.search(&SearchRequest::new("mud", algorithm, 3)).unwrap();
        assert_eq!(out.trees.len(), 1, "{algorithm}");
    }
}

#[test]
fn expansion_budget_stops_every_strategy() {
    let limits = SearchLimits {
        max_expansions: 1,
        ..SearchLimits::default()
    };
    let e = engine_with(catalogs::starter(), limits);

    for algorithm in Algorithm::ALL {
        for max in [1, 5] {
            let out = e.search(&SearchRequest::new("life", algorithm, max)).unwrap();
            assert!(out.limits_hit.expansions, "{algorithm} max={max}");
            assert!(out.trees.len() <= max);
        }
    }
}

#[test]
fn queue_overflow_evicts_and_is_reported() {
    let limits = SearchLimits {
        max_queue_size: 1,
        ..SearchLimits::default()
    };
    let e = engine_with(catalogs::starter(), limits);

    let out = e
        .search(&SearchRequest::new("life", Algorithm::Bfs, 10).with_options(trees_mode()))
        .unwrap();
    assert!(out.limits_hit.queue);
    assert!(out.trees.len() < 4);
}

#[test]
fn default_limits_leave_small_searches_untouched() {
    let e = engine_with(catalogs::starter(), SearchLimits::default());
    for algorithm in Algorithm::ALL {
        let out = e.search(&SearchRequest::new("clay", algorithm, 10)).unwrap();
        assert_eq!(out.trees.len(), 4);
        assert!(!out.limits_hit.any(), "{algorithm}: {:?}", out.limits_hit);
    }
}
