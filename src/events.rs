use std::convert::Infallible;

use axum::body::{Body, Bytes};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};

use crate::models::ValidatedResult;

/// One record of the caller-facing stream. Events are produced by the run's
/// schedulers, never mutated, and ordered by emission time only.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SearchEvent {
    Progress(Progress),
    #[serde(rename_all = "camelCase")]
    Results {
        items: Vec<ValidatedResult>,
        candidates_validated: usize,
        candidates_found: usize,
    },
    #[serde(rename_all = "camelCase")]
    Complete {
        candidates_validated: usize,
        candidates_found: usize,
    },
    Error {
        message: String,
    },
}

/// Progress of the two pipeline stages. `candidates_found` is a live-growing
/// denominator: it keeps rising while earlier sources are already being
/// checked.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "stage", rename_all = "lowercase")]
pub enum Progress {
    #[serde(rename_all = "camelCase")]
    Searching {
        sources_completed: usize,
        sources_total: usize,
    },
    #[serde(rename_all = "camelCase")]
    Checking {
        candidates_validated: usize,
        candidates_found: usize,
    },
}

impl SearchEvent {
    pub fn searching(sources_completed: usize, sources_total: usize) -> Self {
        SearchEvent::Progress(Progress::Searching {
            sources_completed,
            sources_total,
        })
    }

    pub fn checking(candidates_validated: usize, candidates_found: usize) -> Self {
        SearchEvent::Progress(Progress::Checking {
            candidates_validated,
            candidates_found,
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        SearchEvent::Error {
            message: message.into(),
        }
    }
}

/// Write half of a run's event channel.
///
/// All producer tasks of a run send into the same channel; a single consumer
/// drains it and serializes each event as one NDJSON line. Once the consumer
/// disconnects, sends become no-ops and the returned flag tells producers to
/// wind down.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<SearchEvent>,
}

impl EventSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SearchEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Sends one event. Returns false when the consumer is gone.
    pub async fn emit(&self, event: SearchEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Serializes one event as a single newline-terminated JSON record
pub fn encode_line(event: &SearchEvent) -> Bytes {
    let mut buf = match serde_json::to_vec(event) {
        Ok(buf) => buf,
        Err(error) => {
            tracing::error!(%error, "Failed to serialize event");
            br#"{"kind":"error","message":"event serialization failed"}"#.to_vec()
        }
    };
    buf.push(b'\n');
    Bytes::from(buf)
}

/// Bridges a run's event channel into an NDJSON response body.
///
/// The body ends when the last sender is dropped. Dropping the body closes
/// the channel, which producers observe as cancellation.
pub fn ndjson_body(rx: mpsc::Receiver<SearchEvent>) -> Body {
    let stream = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(encode_line(&event)));
    Body::from_stream(stream)
}
