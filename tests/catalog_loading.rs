use std::sync::Arc;

use recipe_search::catalog::registry::{Registry, RegistryOptions, TierSource};
use recipe_search::catalog::tiers::tier_report;
use recipe_search::catalog::{parse_catalog_json, CatalogLoader, JsonCatalog, RawElement};
use recipe_search::catalogs;
use recipe_search::engine::{Algorithm, Engine, EngineConfig, SearchRequest};
use recipe_search::error::SearchError;

const SCRAPED: &str = r#"[
  {"name": "Mud", "recipes": [["Earth", "Water"]], "tier": 1},
  {"name": "Plant", "recipes": ["Earth + Rain\nMud + Rain"], "tier": 2},
  {"name": "Rain", "recipes": [["Water + Air", ""]], "tier": 1},
  {"name": "mud", "recipes": [["Fire", "Fire"]]},
  {"name": "Golem", "recipes": [["Clay", "Life"]], "tier": 9},
  {"name": "Fire", "recipes": [["Lava", "Air"]]}
]"#;

#[test]
fn scraped_json_supports_both_recipe_spellings() {
    let raw = parse_catalog_json(SCRAPED.as_bytes()).unwrap();
    assert_eq!(raw.len(), 6);

    let reg = Registry::build(raw, &RegistryOptions::default()).unwrap();
    let plant = reg.lookup("PLANT").unwrap();
    assert_eq!(plant.display, "Plant");
    assert_eq!(plant.recipes.len(), 2);
    assert_eq!(reg.lookup("rain").unwrap().recipes.len(), 1);
    assert_eq!(plant.tier, Some(2));

    let stats = reg.stats();
    assert_eq!(stats.dropped_duplicate_elements, 1);
    // Golem's recipe names two unknown elements; Fire's recipe is on a primitive.
    assert_eq!(stats.dropped_unknown_ingredients, 1);
    assert_eq!(stats.dropped_primitive_recipes, 1);
    assert_eq!(stats.primitives, 4);
    assert_eq!(stats.untiered_elements, 1);

    // The duplicate "mud" record was dropped, the first one kept.
    let mud = reg.lookup("mud").unwrap();
    assert_eq!(mud.recipes.len(), 1);
    assert!(mud.recipes[0].uses(reg.id_of("earth").unwrap()));
}

#[test]
fn json_catalog_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("elements.json");
    std::fs::write(&path, SCRAPED).unwrap();

    let engine = Engine::from_loader(&JsonCatalog::new(&path), EngineConfig::default()).unwrap();
    let out = engine
        .search(&SearchRequest::new("plant", Algorithm::Dfs, 5))
        .unwrap();
    assert_eq!(out.trees.len(), 2);

    let missing = JsonCatalog::new(dir.path().join("nope.json")).load();
    match missing {
        Err(SearchError::Io { stage, .. }) => assert_eq!(stage, "catalog_read"),
        other => panic!("expected an io error, got {other:?}"),
    }
}

#[test]
fn malformed_or_empty_catalogs_are_rejected() {
    assert!(matches!(
        parse_catalog_json(b"{\"name\": \"Mud\"}"),
        Err(SearchError::Json {
            stage: "catalog_parse",
            ..
        })
    ));
    assert!(matches!(
        Registry::build(Vec::new(), &RegistryOptions::default()),
        Err(SearchError::Catalog { .. })
    ));

    let no_primitives = RegistryOptions {
        primitives: Vec::new(),
        ..RegistryOptions::default()
    };
    assert!(matches!(
        Registry::build(catalogs::brick(), &no_primitives),
        Err(SearchError::Catalog { .. })
    ));
}

#[test]
fn catalog_tiers_are_trusted_when_asked() {
    let raw = vec![
        RawElement::new("Mud", &[("Earth", "Water")]).with_tier(1),
        // Declared tier equal to its ingredient's: the recipe breaks the invariant.
        RawElement::new("Brick", &[("Mud", "Fire")]).with_tier(1),
        RawElement::new("Sand", &[("Air", "Earth")]).with_tier(-1),
    ];
    let options = RegistryOptions {
        tiers: TierSource::Catalog,
        ..RegistryOptions::default()
    };
    let reg = Registry::build(raw, &options).unwrap();
    assert_eq!(reg.lookup("brick").unwrap().tier, Some(1));
    assert_eq!(reg.lookup("sand").unwrap().tier, None);
    assert_eq!(reg.lookup("air").unwrap().tier, Some(0));

    let engine = Engine::new(Arc::new(reg), EngineConfig::default());
    for algorithm in Algorithm::ALL {
        for target in ["brick", "sand"] {
            let out = engine
                .search(&SearchRequest::new(target, algorithm, 3))
                .unwrap();
            assert!(out.trees.is_empty(), "{target} via {algorithm}");
        }
        let out = engine
            .search(&SearchRequest::new("mud", algorithm, 3))
            .unwrap();
        assert_eq!(out.trees.len(), 1);
    }
}

#[test]
fn tier_report_summarizes_the_starter_catalog() {
    let reg = Registry::build(catalogs::starter(), &RegistryOptions::default()).unwrap();
    let report = tier_report(&reg);

    assert_eq!(report.by_tier.get(&0), Some(&4));
    assert_eq!(report.by_tier.get(&1), Some(&8));
    assert_eq!(report.max_tier, Some(4));
    // Phoenix: its only recipe named an unknown ingredient.
    assert_eq!(report.unresolved, 1);
    assert_eq!(report.unresolved_without_recipes, 1);
}

#[test]
fn builtin_catalogs_load_through_the_engine() {
    for name in catalogs::names() {
        let raw = catalogs::by_name(name).unwrap();
        let engine = Engine::from_loader(&raw, EngineConfig::default()).unwrap();
        assert!(engine.registry().len() > 4, "{name}");
    }
}
