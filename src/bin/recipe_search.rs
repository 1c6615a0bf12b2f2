//! Search a catalog for derivation trees of one element and print them as JSON.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use recipe_search::catalog::{CatalogLoader, JsonCatalog};
use recipe_search::catalogs;
use recipe_search::engine::{Algorithm, Engine, EngineConfig, SearchRequest};
use recipe_search::export::write_trees;
use recipe_search::search::events::JsonLinesSink;
use recipe_search::search::{BfsMode, SearchOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "recipe_search")]
#[command(about = "Find ways to build an element from the primitives")]
struct Args {
    /// Catalog file in the elements.json format
    #[arg(long, value_name = "PATH", conflicts_with = "builtin")]
    catalog: Option<PathBuf>,

    /// Built-in catalog name
    #[arg(long)]
    builtin: Option<String>,

    /// Element to derive
    #[arg(short, long)]
    target: String,

    /// bfs, dfs or bidirectional
    #[arg(short, long, default_value = "bfs")]
    algorithm: Algorithm,

    #[arg(short = 'n', long, default_value_t = 1)]
    max_results: usize,

    /// auto, shortest, paths or trees
    #[arg(long, default_value = "auto")]
    bfs_mode: BfsMode,

    /// Alternatives kept per intermediate element (bidirectional)
    #[arg(long)]
    max_recipes_per_element: Option<usize>,

    /// Leave path-derived trees partially expanded
    #[arg(long)]
    no_expand: bool,

    /// Run on the calling thread only
    #[arg(long)]
    sequential: bool,

    /// Stream search events to stdout as JSON lines
    #[arg(long)]
    live: bool,

    /// Pause between streamed events
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Write the trees to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Overwrite --out if it exists
    #[arg(long)]
    force: bool,

    /// Engine config (JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let loader: Box<dyn CatalogLoader> = match (&args.catalog, &args.builtin) {
        (Some(path), _) => Box::new(JsonCatalog::new(path)),
        (None, Some(name)) => match catalogs::by_name(name) {
            Some(raw) => Box::new(raw),
            None => bail!(
                "unknown built-in catalog {name:?}; available: {}",
                catalogs::names().join(", ")
            ),
        },
        (None, None) => bail!("pass --catalog <PATH> or --builtin <NAME>"),
    };
    let engine = Engine::from_loader(loader.as_ref(), config).context("building registry")?;

    let mut options = SearchOptions {
        expand_to_basics: !args.no_expand,
        live_update: args.live,
        delay_ms: args.delay_ms,
        bfs_mode: args.bfs_mode,
        parallel: !args.sequential,
        ..SearchOptions::default()
    };
    if let Some(n) = args.max_recipes_per_element {
        options.max_recipes_per_element = n;
    }
    let request =
        SearchRequest::new(&args.target, args.algorithm, args.max_results).with_options(options);

    let outcome = if args.live {
        let sink = JsonLinesSink::new(io::stdout());
        engine.search_live(&request, &sink)?
    } else {
        engine.search(&request)?
    };

    match &args.out {
        Some(path) => write_trees(path, &outcome.trees, args.force)?,
        None if !args.live => {
            println!("{}", serde_json::to_string_pretty(&outcome.trees)?);
        }
        None => {}
    }

    let hits = outcome.limits_hit;
    eprintln!(
        "{} tree(s) for {:?} via {} | nodes visited: {} | {:.1} ms{}",
        outcome.trees.len(),
        args.target,
        args.algorithm,
        outcome.nodes_visited,
        outcome.elapsed.as_secs_f64() * 1000.0,
        if hits.any() {
            format!(
                " | limits hit: results={} depth={} queue={} expansions={}",
                hits.results, hits.depth, hits.queue, hits.expansions
            )
        } else {
            String::new()
        }
    );
    Ok(())
}
