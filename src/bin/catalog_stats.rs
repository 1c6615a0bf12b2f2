//! Print registry statistics and the tier distribution of a catalog as JSON.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use recipe_search::catalog::registry::{Registry, RegistryStats};
use recipe_search::catalog::tiers::{tier_report, TierReport};
use recipe_search::catalog::{CatalogLoader, JsonCatalog};
use recipe_search::catalogs;
use recipe_search::engine::EngineConfig;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "catalog_stats")]
#[command(about = "Summarize a recipe catalog")]
struct Args {
    #[arg(long, value_name = "PATH", conflicts_with = "builtin")]
    catalog: Option<PathBuf>,

    #[arg(long)]
    builtin: Option<String>,

    /// Engine config (JSON); only the registry section is used
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Report {
    source: String,
    stats: RegistryStats,
    tiers: TierReport,
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

    let (source, raw) = match (&args.catalog, &args.builtin) {
        (Some(path), _) => (
            path.display().to_string(),
            JsonCatalog::new(path).load()?,
        ),
        (None, Some(name)) => match catalogs::by_name(name) {
            Some(raw) => (format!("builtin:{name}"), raw),
            None => bail!(
                "unknown built-in catalog {name:?}; available: {}",
                catalogs::names().join(", ")
            ),
        },
        (None, None) => bail!("pass --catalog <PATH> or --builtin <NAME>"),
    };

    let registry = Registry::build(raw, &config.registry).context("building registry")?;
    let report = Report {
        source,
        stats: registry.stats(),
        tiers: tier_report(&registry),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
