use std::sync::Arc;

use recipe_search::catalog::registry::{Registry, RegistryOptions};
use recipe_search::catalog::RawElement;
use recipe_search::catalogs;
use recipe_search::codec::{canonicalize, check_tree};
use recipe_search::engine::{Algorithm, Engine, EngineConfig, SearchOutcome, SearchRequest};
use recipe_search::search::{BfsMode, SearchOptions};

const BRICK_VIA_MUD: &str = "N<Brick>C<N<Fire>,N<Mud>C<N<Earth>,N<Water>>>";
const BRICK_VIA_SAND: &str = "N<Brick>C<N<Fire>,N<Sand>C<N<Air>,N<Earth>>>";

fn engine(raw: Vec<RawElement>) -> Engine {
    let registry = Registry::build(raw, &RegistryOptions::default()).unwrap();
    Engine::new(Arc::new(registry), EngineConfig::default())
}

fn signatures(outcome: &SearchOutcome) -> Vec<String> {
    outcome.trees.iter().map(canonicalize).collect()
}

fn search(engine: &Engine, target: &str, algorithm: Algorithm, max: usize) -> SearchOutcome {
    engine
        .search(&SearchRequest::new(target, algorithm, max))
        .unwrap()
}

#[test]
fn brick_dfs_finds_the_single_derivation() {
    let e = engine(catalogs::brick());
    let out = search(&e, "brick", Algorithm::Dfs, 3);

    assert_eq!(signatures(&out), vec![BRICK_VIA_MUD]);
    assert!(out.trees[0].highlight);
    assert!(out.trees[0].children.iter().all(|c| !c.highlight));
    assert!(out.nodes_visited > 0);
    assert!(!out.limits_hit.results);
}

#[test]
fn brick_bfs_shortest_has_depth_two() {
    let e = engine(catalogs::brick());
    let out = search(&e, "Brick", Algorithm::Bfs, 1);

    assert_eq!(out.trees.len(), 1);
    assert_eq!(out.trees[0].depth(), 2);
    assert_eq!(signatures(&out), vec![BRICK_VIA_MUD]);
}

#[test]
fn second_brick_recipe_gives_two_trees_for_every_algorithm() {
    let e = engine(catalogs::brick_sand());
    for algorithm in Algorithm::ALL {
        let out = search(&e, "brick", algorithm, 2);
        assert_eq!(
            signatures(&out),
            vec![BRICK_VIA_MUD, BRICK_VIA_SAND],
            "{algorithm}"
        );
    }
}

#[test]
fn bfs_path_modes_turn_paths_into_trees() {
    let e = engine(catalogs::brick_sand());

    let paths = SearchOptions {
        bfs_mode: BfsMode::Paths,
        ..SearchOptions::default()
    };
    let out = e
        .search(&SearchRequest::new("brick", Algorithm::Bfs, 2).with_options(paths.clone()))
        .unwrap();
    assert_eq!(signatures(&out), vec![BRICK_VIA_MUD, BRICK_VIA_SAND]);

    // Without completion, ingredients off the path stay leaves.
    let partial = SearchOptions {
        expand_to_basics: false,
        bfs_mode: BfsMode::Shortest,
        ..paths
    };
    let out = e
        .search(&SearchRequest::new("brick", Algorithm::Bfs, 1).with_options(partial))
        .unwrap();
    assert_eq!(out.trees.len(), 1);
    assert_eq!(out.trees[0].depth(), 1);
    assert!(check_tree(e.registry(), &out.trees[0], true).is_ok());
    assert!(check_tree(e.registry(), &out.trees[0], false).is_err());
}

#[test]
fn starter_counts_agree_across_algorithms() {
    let e = engine(catalogs::starter());
    // Every derivation of these fits within the default caps.
    let expected = [
        ("mud", 1),
        ("stone", 2),
        ("cloud", 2),
        ("plant", 2),
        ("swamp", 2),
        ("sand", 4),
        ("glass", 4),
        ("clay", 4),
        ("lightning", 2),
        ("life", 4),
        ("brick", 1),
    ];

    for (target, count) in expected {
        let reference = signatures(&search(&e, target, Algorithm::Dfs, 50));
        assert_eq!(reference.len(), count, "{target}");
        for algorithm in [Algorithm::Bfs, Algorithm::Bidirectional] {
            let got = signatures(&search(&e, target, algorithm, 50));
            assert_eq!(got, reference, "{target} via {algorithm}");
        }
    }
}

#[test]
fn tier_breaking_recipes_are_never_used() {
    let e = engine(catalogs::starter());
    // `brick = clay + fire` and `lava = stone + fire` break the tier order.
    for algorithm in Algorithm::ALL {
        for target in ["brick", "lava"] {
            let out = search(&e, target, algorithm, 10);
            assert_eq!(out.trees.len(), 1, "{target} via {algorithm}");
            assert!(out.trees[0]
                .iter()
                .all(|n| n.name != "Clay" && n.name != "Stone"));
        }
    }
}
