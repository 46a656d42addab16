use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use futures::future::try_join_all;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    error::AppResult,
    events::{EventSink, SearchEvent},
    models::{Candidate, SearchRequest, SourceConfig, ValidatedResult},
    services::{catalog::CatalogClient, prober::AvailabilityProber, waves},
    sources::SourceRegistry,
};

/// Shared, monotonic counters of one run.
///
/// All mutation goes through these methods, so the bounds
/// (`sources_completed <= sources_total`,
/// `candidates_validated <= candidates_found`) hold at every observation
/// point. `candidates_found` is credited at source search completion,
/// strictly before that source's candidates are probed.
#[derive(Debug)]
pub struct RunState {
    sources_total: usize,
    sources_completed: AtomicUsize,
    candidates_found: AtomicUsize,
    candidates_validated: AtomicUsize,
}

impl RunState {
    fn new(sources_total: usize) -> Self {
        Self {
            sources_total,
            sources_completed: AtomicUsize::new(0),
            candidates_found: AtomicUsize::new(0),
            candidates_validated: AtomicUsize::new(0),
        }
    }

    /// Records one source as processed, returning the new count
    fn source_completed(&self) -> usize {
        self.sources_completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Credits a completed source's candidate count to the denominator
    fn credit_candidates(&self, count: usize) -> usize {
        self.candidates_found.fetch_add(count, Ordering::SeqCst) + count
    }

    /// Records one candidate's verdict as arrived, returning the new count
    fn candidate_checked(&self) -> usize {
        self.candidates_validated.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn sources_total(&self) -> usize {
        self.sources_total
    }

    pub fn candidates_found(&self) -> usize {
        self.candidates_found.load(Ordering::SeqCst)
    }

    pub fn candidates_validated(&self) -> usize {
        self.candidates_validated.load(Ordering::SeqCst)
    }
}

/// Concurrency bounds for the two schedulers
#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    /// Sources searched concurrently per wave
    pub search_wave_size: usize,
    /// Candidates of one source probed concurrently per sub-batch
    pub probe_batch_size: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            search_wave_size: 10,
            probe_batch_size: 10,
        }
    }
}

/// The streaming search pipeline.
///
/// Fans a query out across sources in bounded waves, probes each source's
/// candidates in bounded sub-batches, and pushes typed events into the run's
/// sink as work completes. One bad source never blocks the rest.
#[derive(Clone)]
pub struct SearchPipeline {
    catalog: Arc<dyn CatalogClient>,
    prober: Arc<dyn AvailabilityProber>,
    limits: BatchLimits,
}

impl SearchPipeline {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        prober: Arc<dyn AvailabilityProber>,
        limits: BatchLimits,
    ) -> Self {
        Self {
            catalog,
            prober,
            limits,
        }
    }

    /// Runs one search end to end, emitting every event into `sink`.
    ///
    /// Emits exactly one terminal event (`complete` or `error`) unless the
    /// consumer disconnects first, in which case no further events are sent
    /// and in-flight work winds down. Not restartable.
    pub async fn run(&self, registry: &SourceRegistry, request: SearchRequest, sink: EventSink) {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("search_run", run_id = %run_id);

        async {
            let query = request.query.trim().to_string();
            if query.is_empty() {
                sink.emit(SearchEvent::error("Invalid query")).await;
                return;
            }

            let sources = registry.resolve(&request.sources);
            if sources.is_empty() {
                sink.emit(SearchEvent::error("No valid sources")).await;
                return;
            }

            let state = Arc::new(RunState::new(sources.len()));
            if !sink.emit(SearchEvent::searching(0, state.sources_total())).await {
                return;
            }

            tracing::info!(
                query = %query,
                sources = state.sources_total(),
                page = request.page,
                "Search run started"
            );

            let task = {
                let pipeline = self.clone();
                let state = Arc::clone(&state);
                let sink = sink.clone();
                let page = request.page;
                tokio::spawn(
                    async move {
                        pipeline.search_all(sources, query, page, state, sink).await;
                    }
                    .instrument(tracing::Span::current()),
                )
            };

            // Last line of defense: a panic escaping the schedulers becomes
            // one terminal error event instead of a silently truncated stream.
            match task.await {
                Ok(()) => {
                    let validated = state.candidates_validated();
                    let found = state.candidates_found();
                    sink.emit(SearchEvent::Complete {
                        candidates_validated: validated,
                        candidates_found: found,
                    })
                    .await;
                    tracing::info!(validated = validated, found = found, "Search run completed");
                }
                Err(error) => {
                    tracing::error!(%error, "Search task failed");
                    sink.emit(SearchEvent::error("Internal error during search"))
                        .await;
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Fan-out search scheduler: processes sources in bounded waves
    async fn search_all(
        self,
        sources: Vec<SourceConfig>,
        query: String,
        page: u32,
        state: Arc<RunState>,
        sink: EventSink,
    ) {
        waves::run_in_waves(sources, self.limits.search_wave_size, |source| {
            let pipeline = self.clone();
            let query = query.clone();
            let state = Arc::clone(&state);
            let sink = sink.clone();
            async move {
                pipeline
                    .search_source(source, &query, page, &state, &sink)
                    .await;
            }
        })
        .await;
    }

    /// Searches one source and, when it yields candidates, immediately drives
    /// their validation. Failures never escape the source boundary.
    async fn search_source(
        &self,
        source: SourceConfig,
        query: &str,
        page: u32,
        state: &RunState,
        sink: &EventSink,
    ) {
        let outcome = self.catalog.search(query, &source, page).await;

        // Completion is counted the same way for success and failure
        let completed = state.source_completed();
        if !sink
            .emit(SearchEvent::searching(completed, state.sources_total()))
            .await
        {
            return;
        }

        let candidates = match outcome {
            Ok(candidates) => candidates,
            Err(error) => {
                tracing::warn!(source = %source.id, %error, "Source search failed");
                return;
            }
        };

        if candidates.is_empty() {
            return;
        }

        state.credit_candidates(candidates.len());

        if let Err(error) = self.validate_source(&source.id, candidates, state, sink).await {
            tracing::warn!(source = %source.id, %error, "Availability check aborted for source");
        }
    }

    /// Validation scheduler: probes one source's candidates in sequential
    /// sub-batches. The first prober error aborts the rest of this source's
    /// validation; verdicts already resolved in the failing sub-batch are
    /// discarded.
    async fn validate_source(
        &self,
        source_id: &str,
        candidates: Vec<Candidate>,
        state: &RunState,
        sink: &EventSink,
    ) -> AppResult<()> {
        for batch in waves::split_into_waves(candidates, self.limits.probe_batch_size) {
            if sink.is_closed() {
                return Ok(());
            }

            let verdicts = try_join_all(
                batch
                    .into_iter()
                    .map(|candidate| self.check_candidate(candidate, state, sink)),
            )
            .await?;

            let validated: Vec<ValidatedResult> = verdicts.into_iter().flatten().collect();
            if validated.is_empty() {
                continue;
            }

            let count = validated.len();
            let event = SearchEvent::Results {
                items: validated,
                candidates_validated: state.candidates_validated(),
                candidates_found: state.candidates_found(),
            };
            if !sink.emit(event).await {
                return Ok(());
            }

            tracing::debug!(source = %source_id, results = count, "Validated sub-batch streamed");
        }

        Ok(())
    }

    /// Probes one candidate and reports its verdict
    async fn check_candidate(
        &self,
        candidate: Candidate,
        state: &RunState,
        sink: &EventSink,
    ) -> AppResult<Option<ValidatedResult>> {
        let usable = self.prober.check(&candidate).await?;

        let validated = state.candidate_checked();
        sink.emit(SearchEvent::checking(validated, state.candidates_found()))
            .await;

        Ok(usable.then_some(candidate))
    }
}
