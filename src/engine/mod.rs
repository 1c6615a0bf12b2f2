//! Public entry point: one [`Engine`] per loaded catalog, any number of searches against it.
//!
//! The engine validates the request, handles the trivial targets itself (primitives, unknown
//! names) and hands everything else to the selected [`Strategy`]. Whatever the strategy returns
//! is deduplicated and capped by the collector, sorted by canonical signature and highlighted.

pub mod config;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::catalog::registry::Registry;
use crate::catalog::CatalogLoader;
use crate::core::name::normalize;
use crate::core::tree::DerivationTree;
use crate::error::SearchError;
use crate::search::bfs::BreadthFirst;
use crate::search::bidirectional::Bidirectional;
use crate::search::collector::ResultCollector;
use crate::search::dfs::MemoizedDfs;
use crate::search::events::{with_live_stream, EventEmitter, EventSink, EventStatus, SearchEvent};
use crate::search::limits::{Budget, LimitHits};
use crate::search::pool::WorkerPool;
use crate::search::{SearchContext, SearchOptions, Strategy};

pub use config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Bfs,
    Dfs,
    #[serde(alias = "bidir")]
    Bidirectional,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Bfs, Algorithm::Dfs, Algorithm::Bidirectional];

    fn strategy(self) -> &'static dyn Strategy {
        match self {
            Algorithm::Bfs => &BreadthFirst,
            Algorithm::Dfs => &MemoizedDfs,
            Algorithm::Bidirectional => &Bidirectional,
        }
    }
}

impl FromStr for Algorithm {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bfs" => Ok(Algorithm::Bfs),
            "dfs" => Ok(Algorithm::Dfs),
            "bidirectional" | "bidir" => Ok(Algorithm::Bidirectional),
            other => Err(SearchError::invalid_request(format!(
                "unknown algorithm {other:?} (expected bfs, dfs or bidirectional)"
            ))),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Algorithm::Bfs => "bfs",
            Algorithm::Dfs => "dfs",
            Algorithm::Bidirectional => "bidirectional",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub target: String,
    pub algorithm: Algorithm,
    pub max_results: usize,
    #[serde(default)]
    pub options: SearchOptions,
}

impl SearchRequest {
    pub fn new(target: impl Into<String>, algorithm: Algorithm, max_results: usize) -> Self {
        Self {
            target: target.into(),
            algorithm,
            max_results,
            options: SearchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Distinct trees ordered by canonical signature, roots highlighted.
    pub trees: Vec<DerivationTree>,
    pub nodes_visited: u64,
    pub limits_hit: LimitHits,
    pub elapsed: Duration,
}

impl SearchOutcome {
    fn empty(started: Instant) -> Self {
        Self {
            elapsed: started.elapsed(),
            ..Self::default()
        }
    }
}

pub struct Engine {
    registry: Arc<Registry>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(registry: Arc<Registry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Load a catalog and build the registry with `config.registry`.
    pub fn from_loader(
        loader: &dyn CatalogLoader,
        config: EngineConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        let raw = loader.load()?;
        let registry = Registry::build(raw, &config.registry)?;
        Ok(Self::new(Arc::new(registry), config))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a search without a live stream. Requests with `live_update` set are rejected, since
    /// there is nowhere to stream to; use [`Engine::search_live`] for those.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        if request.options.live_update {
            return Err(SearchError::invalid_request(
                "live_update needs an event sink (use Engine::search_live)",
            ));
        }
        self.run(request, &EventEmitter::disabled())
    }

    /// Like [`Engine::search`], streaming events to `sink` as they happen when the request sets
    /// `live_update`. Without it the sink receives nothing. A failing sink does not fail the
    /// search.
    pub fn search_live(
        &self,
        request: &SearchRequest,
        sink: &dyn EventSink,
    ) -> Result<SearchOutcome, SearchError> {
        if !request.options.live_update {
            return self.run(request, &EventEmitter::disabled());
        }
        let delay = Duration::from_millis(request.options.delay_ms);
        with_live_stream(sink, delay, |events| self.run(request, events))
    }

    fn run(
        &self,
        request: &SearchRequest,
        events: &EventEmitter,
    ) -> Result<SearchOutcome, SearchError> {
        let started = Instant::now();
        let key = normalize(&request.target);
        if key.is_empty() {
            events.milestone(SearchEvent::new(
                EventStatus::Error,
                "empty target name",
                0,
            ));
            return Err(SearchError::invalid_request("target name is empty"));
        }

        events.milestone(SearchEvent::new(
            EventStatus::Started,
            format!("searching {} with {}", request.target.trim(), request.algorithm),
            0,
        ));

        let outcome = self.dispatch(request, &key, events, started);

        events.milestone(SearchEvent::new(
            EventStatus::Completed,
            format!("found {} derivations", outcome.trees.len()),
            outcome.nodes_visited,
        ));
        tracing::debug!(
            target_name = %key,
            algorithm = %request.algorithm,
            trees = outcome.trees.len(),
            nodes_visited = outcome.nodes_visited,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "search finished"
        );
        Ok(outcome)
    }

    fn dispatch(
        &self,
        request: &SearchRequest,
        key: &str,
        events: &EventEmitter,
        started: Instant,
    ) -> SearchOutcome {
        if request.max_results == 0 {
            return SearchOutcome::empty(started);
        }
        let reg = &*self.registry;
        let Some(target) = reg.id_of(key) else {
            tracing::debug!(target_name = %key, "target not in catalog");
            return SearchOutcome::empty(started);
        };
        if reg.is_primitive_id(target) {
            let mut leaf = DerivationTree::leaf(reg.display(target));
            leaf.highlight = true;
            return SearchOutcome {
                trees: vec![leaf],
                nodes_visited: 1,
                limits_hit: LimitHits::default(),
                elapsed: started.elapsed(),
            };
        }

        let budget = Budget::new(self.config.limits);
        let collector = ResultCollector::new(request.max_results);
        let pool = if request.options.parallel {
            WorkerPool::new(self.config.workers)
        } else {
            WorkerPool::new(1)
        };
        let strategy = request.algorithm.strategy();
        let ctx = SearchContext {
            registry: reg,
            target,
            max_results: request.max_results,
            options: &request.options,
            budget: &budget,
            collector: &collector,
            events,
            pool,
        };

        tracing::debug!(
            target_name = %key,
            strategy = strategy.name(),
            workers = pool.workers(),
            max_results = request.max_results,
            "search start"
        );
        strategy.search(&ctx);

        let limits_hit = budget.hits(collector.truncated());
        let mut trees = collector.into_sorted();
        for tree in &mut trees {
            tree.highlight = true;
        }
        SearchOutcome {
            trees,
            nodes_visited: budget.nodes_visited(),
            limits_hit,
            elapsed: started.elapsed(),
        }
    }
}
