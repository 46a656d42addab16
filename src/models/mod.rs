use serde::{Deserialize, Serialize};

/// One externally configured VOD catalog endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub id: String,
    pub name: String,
    /// Base URL of the MacCMS-style `provide/vod` API
    pub api_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> u32 {
    999
}

/// One end-to-end search submitted by a caller
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Source ids to fan out to. Unknown ids are silently dropped; duplicates
    /// are searched once each, in request order.
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

/// An unvalidated entry returned by one source's search
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub source_id: String,
    /// Catalog-assigned id, unique within the source only
    pub vod_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// First playable HLS URL extracted from the catalog entry, probed by the
    /// availability check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_url: Option<String>,
}

/// A candidate confirmed usable by the availability prober. Passing
/// validation relabels the candidate; no data is added.
pub type ValidatedResult = Candidate;

// ============================================================================
// MacCMS VOD API Types
// ============================================================================

/// Raw response of `GET {api_url}?ac=videolist&wd={query}&pg={page}`
#[derive(Debug, Clone, Deserialize)]
pub struct VodSearchResponse {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub list: Vec<VodItem>,
}

/// One raw catalog entry as returned by a MacCMS API
#[derive(Debug, Clone, Deserialize)]
pub struct VodItem {
    pub vod_id: i64,
    pub vod_name: String,
    #[serde(default)]
    pub vod_pic: Option<String>,
    #[serde(default)]
    pub vod_year: Option<String>,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub vod_remarks: Option<String>,
    #[serde(default)]
    pub vod_play_url: Option<String>,
}

impl VodItem {
    /// Converts a raw catalog entry into a candidate for the given source
    pub fn into_candidate(self, source_id: &str) -> Candidate {
        Candidate {
            source_id: source_id.to_string(),
            vod_id: self.vod_id,
            name: self.vod_name,
            poster: self.vod_pic.filter(|v| !v.is_empty()),
            year: self.vod_year.filter(|v| !v.is_empty()),
            type_name: self.type_name.filter(|v| !v.is_empty()),
            remarks: self.vod_remarks.filter(|v| !v.is_empty()),
            play_url: self.vod_play_url.as_deref().and_then(first_m3u8_url),
        }
    }
}

/// Extracts the first playable m3u8 URL from a MacCMS `vod_play_url` field.
///
/// The field encodes play groups separated by `$$$`, episodes within a group
/// separated by `#`, and each episode as `label$url`.
pub fn first_m3u8_url(raw: &str) -> Option<String> {
    for group in raw.split("$$$") {
        for episode in group.split('#') {
            let url = episode.rsplit('$').next().unwrap_or(episode);
            if url.starts_with("http") && url.contains(".m3u8") {
                return Some(url.to_string());
            }
        }
    }
    None
}
