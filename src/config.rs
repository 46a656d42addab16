use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// How many sources are searched concurrently per wave
    #[serde(default = "default_search_wave_size")]
    pub search_wave_size: usize,

    /// How many candidates of one source are probed concurrently per sub-batch
    #[serde(default = "default_probe_batch_size")]
    pub probe_batch_size: usize,

    /// Timeout for one catalog search call, in seconds
    #[serde(default = "default_catalog_timeout_secs")]
    pub catalog_timeout_secs: u64,

    /// Timeout for one availability probe, in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Optional path to a JSON file with additional catalog sources.
    /// Entries sharing an id with a built-in source replace it.
    #[serde(default)]
    pub sources_file: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_search_wave_size() -> usize {
    10
}

fn default_probe_batch_size() -> usize {
    10
}

fn default_catalog_timeout_secs() -> u64 {
    10
}

fn default_probe_timeout_secs() -> u64 {
    5
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            search_wave_size: default_search_wave_size(),
            probe_batch_size: default_probe_batch_size(),
            catalog_timeout_secs: default_catalog_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            sources_file: None,
        }
    }
}
