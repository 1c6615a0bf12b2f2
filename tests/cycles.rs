use std::sync::Arc;

use recipe_search::catalog::registry::{Registry, RegistryOptions};
use recipe_search::catalogs;
use recipe_search::codec::check_tree;
use recipe_search::engine::{Algorithm, Engine, EngineConfig, SearchRequest};
use recipe_search::search::{BfsMode, SearchOptions};

fn cyclic_engine(admit_untiered: bool) -> Engine {
    let options = RegistryOptions {
        admit_untiered,
        ..RegistryOptions::default()
    };
    let registry = Registry::build(catalogs::cyclic(), &options).unwrap();
    Engine::new(Arc::new(registry), EngineConfig::default())
}

fn all_requests(target: &str) -> Vec<SearchRequest> {
    let mut out = Vec::new();
    for algorithm in Algorithm::ALL {
        for max in [1, 4] {
            out.push(SearchRequest::new(target, algorithm, max));
        }
    }
    for mode in [BfsMode::Paths, BfsMode::Trees] {
        out.push(
            SearchRequest::new(target, Algorithm::Bfs, 4).with_options(SearchOptions {
                bfs_mode: mode,
                ..SearchOptions::default()
            }),
        );
    }
    out
}

#[test]
fn mutually_recursive_elements_are_untiered_and_excluded() {
    let e = cyclic_engine(false);
    let reg = e.registry();
    for name in ["x", "y", "z"] {
        assert_eq!(reg.lookup(name).unwrap().tier, None, "{name}");
        assert_eq!(reg.valid_recipes(reg.id_of(name).unwrap()).count(), 0);
    }

    for target in ["x", "y", "z"] {
        for request in all_requests(target) {
            let out = e.search(&request).unwrap();
            assert!(out.trees.is_empty(), "{target} via {}", request.algorithm);
        }
    }
}

#[test]
fn ordinary_elements_next_to_a_cycle_still_resolve() {
    for admit in [false, true] {
        let e = cyclic_engine(admit);
        for request in all_requests("mud") {
            let out = e.search(&request).unwrap();
            assert_eq!(out.trees.len(), 1, "admit={admit} via {}", request.algorithm);
        }
    }
}

#[test]
fn admitted_cycles_terminate_without_results() {
    let e = cyclic_engine(true);
    let reg = e.registry();
    assert!(reg.admits_untiered());
    assert!(reg.valid_recipes(reg.id_of("x").unwrap()).count() > 0);

    for target in ["x", "y", "z"] {
        for request in all_requests(target) {
            let out = e.search(&request).unwrap();
            for tree in &out.trees {
                assert_eq!(check_tree(reg, tree, false), Ok(()));
            }
            assert!(out.trees.is_empty(), "{target} via {}", request.algorithm);
        }
    }
}
