//! Canonical feed model shared by the fetcher, the renderer and the API.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_FEED_TITLE: &str = "RSS Feed";
pub const NO_TITLE: &str = "No Title";
pub const NO_DESCRIPTION: &str = "No description available";

/// Provider-agnostic feed produced by the normalizer.
///
/// Items are kept as the provider sent them; `entries()` gives the
/// render-time view with defaults applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFeed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub items: Vec<Value>,
    /// Remaining top-level fields of a pass-through payload.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CanonicalFeed {
    pub fn entries(&self) -> Vec<CanonicalItem> {
        self.items.iter().map(CanonicalItem::from_value).collect()
    }

    /// Whether there is anything worth showing in the feed header.
    pub fn has_header(&self) -> bool {
        is_present(self.title.as_deref()) || is_present(self.description.as_deref())
    }
}

/// One feed item after render-time defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalItem {
    pub title: String,
    pub published_at: Option<String>,
    pub description: String,
    pub link: Option<String>,
}

impl CanonicalItem {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            title: first_text(raw, &["title"]).unwrap_or(NO_TITLE).to_string(),
            published_at: first_text(raw, &["pubDate", "published", "date"]).map(str::to_string),
            description: first_text(raw, &["description", "content", "summary"])
                .unwrap_or(NO_DESCRIPTION)
                .to_string(),
            link: first_text(raw, &["link", "url"]).map(str::to_string),
        }
    }
}

/// First key holding a non-empty string.
pub fn first_text<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| raw.get(*key).and_then(Value::as_str))
        .find(|text| !text.is_empty())
}

fn is_present(text: Option<&str>) -> bool {
    text.is_some_and(|t| !t.is_empty())
}

/// Details of one user-initiated fetch, shown next to the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallMetadata {
    pub request_url: String,
    pub api_endpoint: Option<String>,
    pub service_name: Option<String>,
    pub http_status: Option<u16>,
    pub response_time_ms: Option<u64>,
    pub requested_at: DateTime<Utc>,
    pub request_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub fallback_used: bool,
    #[serde(default)]
    pub mock_data: bool,
    pub error: Option<String>,
}

impl ApiCallMetadata {
    pub fn new(request_url: impl Into<String>) -> Self {
        let mut request_headers = BTreeMap::new();
        request_headers.insert("Accept".to_string(), "application/json".to_string());
        Self {
            request_url: request_url.into(),
            api_endpoint: None,
            service_name: None,
            http_status: None,
            response_time_ms: None,
            requested_at: Utc::now(),
            request_headers,
            fallback_used: false,
            mock_data: false,
            error: None,
        }
    }

    pub fn is_success_status(&self) -> bool {
        matches!(self.http_status, Some(200..=299))
    }

    /// "Accept: application/json, ..." for display.
    pub fn headers_line(&self) -> String {
        self.request_headers
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}
