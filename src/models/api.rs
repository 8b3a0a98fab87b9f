//! Inbound HTTP API type definitions.
//!
//! These are the request and response bodies exchanged with the browser
//! extension. Field names (including the upper-case `DETECTED`) are kept
//! compatible with the extension's background worker.

// Author: kelexine (https://github.com/kelexine)

use super::verdict::Verdict;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64 encoded frame (JPEG from the extension).
    pub image: String,

    /// Source URL of the video; enables caption history when non-empty.
    #[serde(default)]
    pub video_url: String,

    /// Page title, used for logging only.
    #[serde(default)]
    pub video_title: String,

    /// Free-text description of what to detect; empty selects the default prompt.
    #[serde(default)]
    pub prompt: String,

    /// Caption text visible when the frame was captured.
    #[serde(default)]
    pub captions: String,

    /// Per-tab session id; keeps viewers behind one NAT address apart.
    #[serde(default)]
    pub session_id: String,
}

/// Body returned by `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub verdict: Verdict,

    /// True when the verdict was replayed from the cache.
    pub cached: bool,
}

/// Body returned by `GET /`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub service: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}

/// Body returned by `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub api_key_configured: bool,
    pub cache_size: usize,
    pub rate_limit_tracking: usize,
}

/// Configured admission limits.
#[derive(Debug, Serialize, Deserialize)]
pub struct RateLimitsInfo {
    pub per_minute: usize,
    pub per_hour: usize,
}

/// Body returned by `GET /api/stats`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub your_ip: String,
    pub requests_last_hour: usize,
    pub limit_per_hour: usize,
    pub remaining: usize,
    pub cache_entries: usize,
    pub rate_limits: RateLimitsInfo,
    pub total_tracked_ips: usize,
}

/// Body returned by `DELETE /api/cache`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearCacheResponse {
    pub status: String,
    /// Number of entries held right before the cache was cleared.
    pub entries_removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_optional_fields_default() {
        let req: AnalyzeRequest = serde_json::from_str(r#"{"image": "aGk="}"#).unwrap();
        assert_eq!(req.image, "aGk=");
        assert!(req.video_url.is_empty());
        assert!(req.prompt.is_empty());
        assert!(req.session_id.is_empty());
    }

    #[test]
    fn test_response_flattens_verdict() {
        let resp = AnalyzeResponse {
            verdict: Verdict::new(false, 12, "nothing found", ""),
            cached: true,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["DETECTED"], false);
        assert_eq!(json["confidence"], 12);
        assert_eq!(json["reasoning"], "nothing found");
        assert_eq!(json["summary"], "");
        assert_eq!(json["cached"], true);
    }
}
