//! Feed retrieval: URL validation, the primary converter, the relay fallback
//! and demo mode.

use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Context;
use common::{ApiCallMetadata, CanonicalFeed, DemoConfig, Endpoints, ServicesConfig};
use rand::Rng;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use url::Url;

use crate::mock::MockFeed;
use crate::normalize::normalize_response;

pub const PRIMARY_SERVICE: &str = "rss2json.com";
pub const FALLBACK_SERVICE: &str = "rsstojson.com (via proxy)";
pub const MOCK_SERVICE: &str = "Mock Data (Demo Mode)";
pub const MOCK_ENDPOINT: &str = "Local Mock Service";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("Please enter a valid RSS URL")]
    Empty,
    #[error("Please enter a valid URL (must start with http:// or https://)")]
    Scheme,
}

/// A trimmed, absolute http(s) URL as the user typed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUrl(String);

impl FeedUrl {
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(UrlError::Empty);
        }
        match Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self(trimmed.to_string())),
            _ => Err(UrlError::Scheme),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure of a single service attempt.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status}: {reason}")]
    HttpStatus { status: u16, reason: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("converter returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("relay response has no contents")]
    EmptyRelay,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    #[error(transparent)]
    InvalidUrl(#[from] UrlError),
    #[error("Failed to fetch RSS feed: {error}")]
    Service {
        error: FetchError,
        metadata: Box<ApiCallMetadata>,
    },
}

impl FetchFailure {
    pub fn metadata(&self) -> Option<&ApiCallMetadata> {
        match self {
            FetchFailure::InvalidUrl(_) => None,
            FetchFailure::Service { metadata, .. } => Some(metadata.as_ref()),
        }
    }
}

/// Everything the renderer needs for one successful fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedReport {
    pub raw: Value,
    pub feed: CanonicalFeed,
    pub metadata: ApiCallMetadata,
    pub original_xml: Option<String>,
}

/// `{"contents": "..."}` as answered by the relay.
#[derive(Debug, Deserialize)]
struct RelayEnvelope {
    contents: Option<String>,
}

struct Attempt {
    raw: Value,
    original_xml: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FeedClient {
    http: Client,
    endpoints: Endpoints,
    demo: DemoConfig,
}

impl FeedClient {
    pub fn new(services: &ServicesConfig, demo: DemoConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder().user_agent(services.user_agent.clone());
        if let Some(secs) = services.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("failed to build reqwest client")?;
        Ok(Self {
            http,
            endpoints: services.endpoints()?,
            demo,
        })
    }

    pub fn is_mock(&self) -> bool {
        self.demo.mock_mode
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Validates `input`, then tries the primary converter and, if that
    /// fails, the relayed fallback. In demo mode no request is made.
    pub async fn fetch(&self, input: &str) -> Result<FeedReport, FetchFailure> {
        let feed_url = FeedUrl::parse(input)?;
        let mut metadata = ApiCallMetadata::new(feed_url.as_str());

        if self.demo.mock_mode {
            return Ok(self.fetch_mock(&feed_url, metadata).await);
        }

        let attempt = match self.fetch_primary(&feed_url, &mut metadata).await {
            Ok(attempt) => Ok(attempt),
            Err(primary_err) => {
                warn!("{} failed, trying alternative: {}", PRIMARY_SERVICE, primary_err);
                metadata.fallback_used = true;
                self.fetch_fallback(&feed_url, &mut metadata).await
            }
        };

        match attempt {
            Ok(Attempt { raw, original_xml }) => Ok(FeedReport {
                feed: normalize_response(&raw),
                raw,
                metadata,
                original_xml,
            }),
            Err(err) => {
                error!("error fetching RSS feed {}: {}", feed_url, err);
                metadata.error = Some(err.to_string());
                Err(FetchFailure::Service {
                    error: err,
                    metadata: Box::new(metadata),
                })
            }
        }
    }

    async fn fetch_primary(&self, feed_url: &FeedUrl, metadata: &mut ApiCallMetadata) -> Result<Attempt, FetchError> {
        let endpoint = with_query(&self.endpoints.rss2json, "rss_url", feed_url.as_str());
        let relay = with_query(&self.endpoints.relay, "url", feed_url.as_str());
        info!("trying {} API: {}", PRIMARY_SERVICE, endpoint);
        metadata.api_endpoint = Some(endpoint.to_string());

        let started = Instant::now();
        let joined = tokio::try_join!(
            self.http.get(endpoint).header(ACCEPT, "application/json").send(),
            self.http.get(relay).send()
        );
        metadata.response_time_ms = Some(elapsed_ms(started));
        let (json_response, relay_response) = joined?;
        metadata.http_status = Some(json_response.status().as_u16());

        let raw: Value = ensure_success(json_response)?.json().await?;
        metadata.service_name = Some(PRIMARY_SERVICE.to_string());
        info!("{} API response received", PRIMARY_SERVICE);

        Ok(Attempt {
            raw,
            original_xml: read_relay_contents(relay_response).await,
        })
    }

    async fn fetch_fallback(&self, feed_url: &FeedUrl, metadata: &mut ApiCallMetadata) -> Result<Attempt, FetchError> {
        let converter = with_query(&self.endpoints.rsstojson, "rss_url", feed_url.as_str());
        let endpoint = with_query(&self.endpoints.relay, "url", converter.as_str());
        let relay = with_query(&self.endpoints.relay, "url", feed_url.as_str());
        info!("trying relay with rsstojson: {}", endpoint);
        metadata.api_endpoint = Some(endpoint.to_string());

        let started = Instant::now();
        let joined = tokio::try_join!(
            self.http.get(endpoint).header(ACCEPT, "application/json").send(),
            self.http.get(relay).send()
        );
        metadata.response_time_ms = Some(elapsed_ms(started));
        let (json_response, relay_response) = joined?;
        metadata.http_status = Some(json_response.status().as_u16());

        let envelope: RelayEnvelope = ensure_success(json_response)?.json().await?;
        let contents = envelope.contents.ok_or(FetchError::EmptyRelay)?;
        let raw: Value = serde_json::from_str(&contents)?;
        metadata.service_name = Some(FALLBACK_SERVICE.to_string());
        info!("relayed {} response received", FALLBACK_SERVICE);

        Ok(Attempt {
            raw,
            original_xml: read_relay_contents(relay_response).await,
        })
    }

    async fn fetch_mock(&self, feed_url: &FeedUrl, mut metadata: ApiCallMetadata) -> FeedReport {
        info!("using mock data for {} (demo mode)", feed_url);
        let started = Instant::now();
        let delay = self.mock_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mock = MockFeed::generate(feed_url.as_str());

        metadata.response_time_ms = Some(elapsed_ms(started));
        metadata.service_name = Some(MOCK_SERVICE.to_string());
        metadata.api_endpoint = Some(MOCK_ENDPOINT.to_string());
        metadata.http_status = Some(200);
        metadata.mock_data = true;

        FeedReport {
            feed: normalize_response(&mock.json),
            raw: mock.json,
            metadata,
            original_xml: mock.xml,
        }
    }

    fn mock_delay(&self) -> Duration {
        let min = self.demo.mock_delay_min_ms;
        let max = self.demo.mock_delay_max_ms.max(min);
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

fn with_query(base: &Url, key: &str, value: &str) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair(key, value);
    url
}

fn ensure_success(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(FetchError::HttpStatus {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
    })
}

/// Best effort: a failed relay only means the original XML is not shown.
async fn read_relay_contents(response: Response) -> Option<String> {
    let status = response.status();
    if !status.is_success() {
        warn!("original RSS XML unavailable: relay answered {}", status);
        return None;
    }
    match response.json::<RelayEnvelope>().await {
        Ok(RelayEnvelope { contents: Some(xml) }) => {
            info!("original RSS XML fetched ({} bytes)", xml.len());
            Some(xml)
        }
        Ok(_) => None,
        Err(e) => {
            warn!("original RSS XML unreadable: {}", e);
            None
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
