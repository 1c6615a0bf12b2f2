//! Live search events.
//!
//! Strategies never talk to a sink directly. They hold an [`EventEmitter`] and push events into
//! a bounded channel; a single writer thread owns the sink, so messages are never interleaved.
//!
//! - Previews (`progress`) use `try_send` and are dropped when the channel is full.
//! - Milestones (`started`, `result`, `completed`) block until queued.
//!
//! A failing sink is logged once and then bypassed; the search itself keeps running.

use std::io::Write;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::tree::DerivationTree;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Started,
    Progress,
    Result,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEvent {
    pub status: EventStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<DerivationTree>,
    pub nodes_visited: u64,
}

impl SearchEvent {
    pub fn new(status: EventStatus, message: impl Into<String>, nodes_visited: u64) -> Self {
        Self {
            status,
            message: message.into(),
            tree: None,
            nodes_visited,
        }
    }

    pub fn with_tree(mut self, tree: DerivationTree) -> Self {
        self.tree = Some(tree);
        self
    }
}

#[derive(Debug, Error)]
#[error("event sink failed: {0}")]
pub struct SinkError(pub String);

/// Receiver of live events (e.g. a bridge to a web socket).
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &SearchEvent) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &SearchEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn emit(&self, event: &SearchEvent) -> Result<(), SinkError> {
        let mut out = self.out.lock();
        serde_json::to_writer(&mut *out, event).map_err(|e| SinkError(e.to_string()))?;
        out.write_all(b"\n")
            .and_then(|_| out.flush())
            .map_err(|e| SinkError(e.to_string()))
    }
}

/// Producer side of a live stream. Disabled emitters drop everything without allocating.
#[derive(Debug, Clone, Default)]
pub struct EventEmitter {
    tx: Option<Sender<SearchEvent>>,
}

impl EventEmitter {
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Best-effort preview; dropped when the writer is behind.
    pub fn preview(&self, message: impl Into<String>, tree: Option<DerivationTree>, nodes: u64) {
        let Some(tx) = &self.tx else {
            return;
        };
        let mut ev = SearchEvent::new(EventStatus::Progress, message, nodes);
        ev.tree = tree;
        if let Err(TrySendError::Full(_)) = tx.try_send(ev) {
            tracing::trace!("live preview dropped; writer is behind");
        }
    }

    /// Milestone event; waits for room in the channel.
    pub fn milestone(&self, event: SearchEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

/// Run `body` with an enabled emitter whose events are written to `sink` by a dedicated thread.
/// Returns after every queued event was handed to the sink (or discarded after a sink failure).
pub fn with_live_stream<R>(
    sink: &dyn EventSink,
    delay: Duration,
    body: impl FnOnce(&EventEmitter) -> R,
) -> R {
    let (tx, rx) = bounded::<SearchEvent>(CHANNEL_CAPACITY);
    std::thread::scope(|s| {
        let writer = s.spawn(move || write_loop(sink, rx, delay));
        let emitter = EventEmitter { tx: Some(tx) };
        let out = body(&emitter);
        drop(emitter);
        if writer.join().is_err() {
            tracing::warn!("live event writer panicked");
        }
        out
    })
}

fn write_loop(sink: &dyn EventSink, rx: Receiver<SearchEvent>, delay: Duration) {
    let mut failed = false;
    for ev in rx.iter() {
        if failed {
            continue;
        }
        if let Err(e) = sink.emit(&ev) {
            tracing::warn!(error = %e, "event sink failed; live updates disabled for this search");
            failed = true;
            continue;
        }
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}
