use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    services::{
        catalog::{CatalogClient, HttpCatalogClient},
        prober::{AvailabilityProber, HttpAvailabilityProber},
        search_run::{BatchLimits, SearchPipeline},
    },
    sources::SourceRegistry,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SourceRegistry>,
    pub pipeline: SearchPipeline,
}

impl AppState {
    /// Builds production state: HTTP-backed collaborators wired from config
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let registry = Arc::new(SourceRegistry::from_config(config)?);
        let catalog = Arc::new(HttpCatalogClient::new(Duration::from_secs(
            config.catalog_timeout_secs,
        ))?);
        let prober = Arc::new(HttpAvailabilityProber::new(Duration::from_secs(
            config.probe_timeout_secs,
        ))?);
        let limits = BatchLimits {
            search_wave_size: config.search_wave_size,
            probe_batch_size: config.probe_batch_size,
        };

        Ok(Self::with_collaborators(registry, catalog, prober, limits))
    }

    /// Builds state around injected collaborators (used by tests)
    pub fn with_collaborators(
        registry: Arc<SourceRegistry>,
        catalog: Arc<dyn CatalogClient>,
        prober: Arc<dyn AvailabilityProber>,
        limits: BatchLimits,
    ) -> Self {
        Self {
            registry,
            pipeline: SearchPipeline::new(catalog, prober, limits),
        }
    }
}
