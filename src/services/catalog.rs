use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, SourceConfig, VodSearchResponse},
};

/// Remote catalog search abstraction.
///
/// One call searches one source for one page. Network failures, non-success
/// statuses and malformed payloads all surface as errors; isolating them at
/// the source boundary is the scheduler's job, not the client's.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search(
        &self,
        query: &str,
        source: &SourceConfig,
        page: u32,
    ) -> AppResult<Vec<Candidate>>;
}

/// Catalog client for MacCMS-style `provide/vod` APIs
pub struct HttpCatalogClient {
    http: HttpClient,
}

impl HttpCatalogClient {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn search(
        &self,
        query: &str,
        source: &SourceConfig,
        page: u32,
    ) -> AppResult<Vec<Candidate>> {
        let page_param = page.to_string();
        let response = self
            .http
            .get(&source.api_url)
            .query(&[
                ("ac", "videolist"),
                ("wd", query),
                ("pg", page_param.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Catalog(format!(
                "{} returned status {}",
                source.id, status
            )));
        }

        let payload: VodSearchResponse = response.json().await.map_err(|e| {
            AppError::Catalog(format!("{} returned malformed payload: {}", source.id, e))
        })?;

        let candidates: Vec<Candidate> = payload
            .list
            .into_iter()
            .map(|item| item.into_candidate(&source.id))
            .collect();

        tracing::debug!(
            source = %source.id,
            page = page,
            results = candidates.len(),
            "Catalog search completed"
        );

        Ok(candidates)
    }
}
