use crate::{config::Config, models::SourceConfig};

/// Registry of known catalog sources.
///
/// Holds the built-in source table plus any sources loaded from the optional
/// `sources_file`. Resolved configurations are immutable for the lifetime of
/// a run; the registry itself is built once at startup.
#[derive(Debug)]
pub struct SourceRegistry {
    sources: Vec<SourceConfig>,
}

fn builtin(id: &str, name: &str, api_url: &str, priority: u32) -> SourceConfig {
    SourceConfig {
        id: id.to_string(),
        name: name.to_string(),
        api_url: api_url.to_string(),
        enabled: true,
        priority,
    }
}

/// Predefined VOD catalog endpoints
fn default_sources() -> Vec<SourceConfig> {
    vec![
        builtin("dytt", "电影天堂", "http://caiji.dyttzyapi.com/api.php/provide/vod", 1),
        builtin("ruyi", "如意", "https://cj.rycjapi.com/api.php/provide/vod", 2),
        builtin("baofeng", "暴风", "https://bfzyapi.com/api.php/provide/vod", 3),
        builtin("tianya", "天涯", "https://tyyszy.com/api.php/provide/vod", 4),
        builtin("feifan", "非凡影视", "http://ffzy5.tv/api.php/provide/vod", 5),
        builtin("sanliuling", "360", "https://360zy.com/api.php/provide/vod", 6),
        builtin("wolong", "卧龙", "https://wolongzyw.com/api.php/provide/vod", 7),
        builtin("jisu", "极速", "https://jszyapi.com/api.php/provide/vod", 8),
        builtin("mozhua", "魔爪", "https://mozhuazy.com/api.php/provide/vod", 9),
        builtin("modu", "魔都", "https://www.mdzyapi.com/api.php/provide/vod", 10),
        builtin("zuida", "最大", "https://api.zuidapi.com/api.php/provide/vod", 11),
        builtin("yinghua", "樱花", "https://m3u8.apiyhzy.com/api.php/provide/vod", 12),
        builtin("baiduyun", "百度云", "https://api.apibdzy.com/api.php/provide/vod", 13),
        builtin("wujin", "无尽", "https://api.wujinapi.me/api.php/provide/vod", 14),
        builtin("wangwang", "旺旺", "https://wwzy.tv/api.php/provide/vod", 15),
        builtin("ikun", "iKun", "https://ikunzyapi.com/api.php/provide/vod", 16),
    ]
}

impl SourceRegistry {
    /// Creates a registry with only the built-in sources
    pub fn with_defaults() -> Self {
        Self {
            sources: default_sources(),
        }
    }

    /// Creates a registry from configuration, merging the custom sources file
    /// over the built-ins when one is configured
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut registry = Self::with_defaults();

        if let Some(path) = &config.sources_file {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read sources file {}: {}", path, e))?;
            let custom: Vec<SourceConfig> = serde_json::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("Failed to parse sources file {}: {}", path, e))?;

            tracing::info!(path = %path, count = custom.len(), "Loaded custom sources");
            registry.merge_custom(custom);
        }

        Ok(registry)
    }

    /// Merges custom sources: entries sharing an id with an existing source
    /// replace it, new ids are appended
    pub fn merge_custom(&mut self, custom: Vec<SourceConfig>) {
        for source in custom {
            match self.sources.iter_mut().find(|s| s.id == source.id) {
                Some(existing) => *existing = source,
                None => self.sources.push(source),
            }
        }
    }

    /// Looks up one source by id
    pub fn get(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Resolves requested ids to source configurations.
    ///
    /// Unknown ids and disabled sources are silently dropped; the whole call
    /// never fails for partial unknowns. Request order and duplicates are
    /// preserved.
    pub fn resolve(&self, ids: &[String]) -> Vec<SourceConfig> {
        ids.iter()
            .filter_map(|id| self.get(id))
            .filter(|s| s.enabled)
            .cloned()
            .collect()
    }

    /// Returns the enabled sources sorted by priority, for the listing
    /// endpoint
    pub fn enabled(&self) -> Vec<SourceConfig> {
        let mut enabled: Vec<SourceConfig> =
            self.sources.iter().filter(|s| s.enabled).cloned().collect();
        enabled.sort_by_key(|s| s.priority);
        enabled
    }
}
