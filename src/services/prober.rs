use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::Candidate,
};

/// Availability check for one candidate.
///
/// Returns whether the candidate is actually usable. Timeouts and transport
/// failures are probe errors; an unusable candidate is a `false` verdict,
/// not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AvailabilityProber: Send + Sync {
    async fn check(&self, candidate: &Candidate) -> AppResult<bool>;
}

/// Probes a candidate by fetching its playable HLS URL
pub struct HttpAvailabilityProber {
    http: HttpClient,
}

impl HttpAvailabilityProber {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl AvailabilityProber for HttpAvailabilityProber {
    async fn check(&self, candidate: &Candidate) -> AppResult<bool> {
        let Some(url) = &candidate.play_url else {
            // Nothing playable was extracted from the catalog entry
            return Ok(false);
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Probe(format!("{}: {}", candidate.name, e)))?;

        let usable = response.status().is_success();
        tracing::debug!(
            source = %candidate.source_id,
            vod_id = candidate.vod_id,
            usable = usable,
            "Availability probe completed"
        );

        Ok(usable)
    }
}
