use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use recipe_search::catalog::registry::{Registry, RegistryOptions};
use recipe_search::catalogs;
use recipe_search::codec::canonicalize;
use recipe_search::engine::{Algorithm, Engine, EngineConfig, SearchRequest};
use recipe_search::error::SearchError;
use recipe_search::search::events::{
    EventSink, EventStatus, JsonLinesSink, SearchEvent, SinkError,
};
use recipe_search::search::SearchOptions;

#[derive(Default)]
struct Recording {
    events: Mutex<Vec<SearchEvent>>,
}

impl EventSink for Recording {
    fn emit(&self, event: &SearchEvent) -> Result<(), SinkError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Fails on every call and counts how often it was tried.
#[derive(Default)]
struct Broken {
    calls: AtomicUsize,
}

impl EventSink for Broken {
    fn emit(&self, _event: &SearchEvent) -> Result<(), SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SinkError("connection closed".to_string()))
    }
}

fn engine(raw: Vec<recipe_search::catalog::RawElement>) -> Engine {
    let registry = Registry::build(raw, &RegistryOptions::default()).unwrap();
    Engine::new(Arc::new(registry), EngineConfig::default())
}

fn live_options() -> SearchOptions {
    SearchOptions {
        live_update: true,
        ..SearchOptions::default()
    }
}

fn live(algorithm: Algorithm, max: usize) -> SearchRequest {
    SearchRequest::new("brick", algorithm, max).with_options(live_options())
}

#[test]
fn stream_is_framed_by_started_and_completed() {
    let e = engine(catalogs::brick_sand());
    for algorithm in Algorithm::ALL {
        let sink = Recording::default();
        let out = e.search_live(&live(algorithm, 2), &sink).unwrap();
        let events = sink.events.into_inner();

        assert_eq!(events.first().map(|ev| ev.status), Some(EventStatus::Started));
        let last = events.last().unwrap();
        assert_eq!(last.status, EventStatus::Completed);
        assert_eq!(last.nodes_visited, out.nodes_visited);

        let results: Vec<&SearchEvent> = events
            .iter()
            .filter(|ev| ev.status == EventStatus::Result)
            .collect();
        assert_eq!(results.len(), out.trees.len(), "{algorithm}");
        assert!(results.iter().all(|ev| ev.tree.is_some()));
        assert!(events
            .iter()
            .all(|ev| ev.status != EventStatus::Error));
    }
}

#[test]
fn failing_sink_does_not_fail_the_search() {
    let e = engine(catalogs::brick_sand());
    let sink = Broken::default();
    let out = e.search_live(&live(Algorithm::Dfs, 2), &sink).unwrap();

    assert_eq!(out.trees.len(), 2);
    // The writer gives up after the first failure.
    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn json_lines_sink_writes_one_event_per_line() {
    let e = engine(catalogs::brick());
    let sink = JsonLinesSink::new(Vec::<u8>::new());
    e.search_live(&live(Algorithm::Bfs, 1), &sink).unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines.len() >= 3);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["status"], "started");
    let last: SearchEvent = serde_json::from_str(lines[lines.len() - 1]).unwrap();
    assert_eq!(last.status, EventStatus::Completed);
    assert!(last.tree.is_none());

    let result: serde_json::Value = lines
        .iter()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
        .find(|v| v["status"] == "result")
        .unwrap();
    assert_eq!(result["tree"]["name"], "Brick");
}

#[test]
fn rejected_request_reports_an_error_event() {
    let e = engine(catalogs::brick());
    let sink = Recording::default();
    let request = SearchRequest::new("", Algorithm::Dfs, 1).with_options(live_options());
    let res = e.search_live(&request, &sink);

    assert!(res.is_err());
    let events = sink.events.into_inner();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, EventStatus::Error);
}

#[test]
fn primitive_target_streams_only_the_frame() {
    let e = engine(catalogs::brick());
    let sink = Recording::default();
    let request =
        SearchRequest::new("fire", Algorithm::Bidirectional, 3).with_options(live_options());
    let out = e.search_live(&request, &sink).unwrap();
    assert_eq!(out.trees.len(), 1);

    let statuses: Vec<EventStatus> = sink.events.into_inner().iter().map(|ev| ev.status).collect();
    assert_eq!(statuses, vec![EventStatus::Started, EventStatus::Completed]);
}

#[test]
fn live_update_flag_selects_the_stream() {
    let e = engine(catalogs::brick_sand());

    // A live request without a sink is refused.
    let err = e.search(&live(Algorithm::Dfs, 2));
    assert!(matches!(err, Err(SearchError::InvalidRequest { .. })));

    // A sink without the flag stays silent and the outcome is unchanged.
    let sink = Recording::default();
    let quiet = SearchRequest::new("brick", Algorithm::Dfs, 2);
    let out = e.search_live(&quiet, &sink).unwrap();
    assert!(sink.events.into_inner().is_empty());
    assert_eq!(out.trees, e.search(&quiet).unwrap().trees);
}

#[test]
fn pooled_bfs_announces_exactly_the_kept_trees() {
    let e = engine(catalogs::starter());
    let sink = Recording::default();
    let request = SearchRequest::new("life", Algorithm::Bfs, 2).with_options(live_options());
    let out = e.search_live(&request, &sink).unwrap();
    assert_eq!(out.trees.len(), 2);

    let announced: Vec<String> = sink
        .events
        .into_inner()
        .iter()
        .filter(|ev| ev.status == EventStatus::Result)
        .filter_map(|ev| ev.tree.as_ref().map(canonicalize))
        .collect();
    let kept: Vec<String> = out.trees.iter().map(canonicalize).collect();
    assert_eq!(announced, kept);
}
