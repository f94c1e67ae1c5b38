use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{get, routes, Build, Rocket, State};
use serde::Serialize;

use common::{ApiCallMetadata, Config, Theme};

use crate::fetch::{FeedClient, FeedReport, FetchFailure};
use crate::render::{render_page, PageContext, PageState};
use crate::xml_format::XmlFormatter;

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub config: Arc<Config>,
    pub client: FeedClient,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let client = FeedClient::new(&config.services, config.demo.clone())?;
        Ok(Self {
            started_at: Utc::now(),
            config,
            client,
        })
    }
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    mock_mode: bool,
    primary_endpoint: String,
    relay_endpoint: String,
}

/// Body of a successful `/api/v1/feed` call.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedResponse {
    #[serde(flatten)]
    report: FeedReport,
    formatted_xml: Option<String>,
}

/// Body of a failed `/api/v1/feed` call.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<ApiCallMetadata>,
}

type ApiError = (Status, Json<ErrorBody>);

fn api_error(failure: FetchFailure) -> ApiError {
    let status = match failure {
        FetchFailure::InvalidUrl(_) => Status::BadRequest,
        FetchFailure::Service { .. } => Status::BadGateway,
    };
    let body = ErrorBody {
        error: failure.to_string(),
        metadata: failure.metadata().cloned(),
    };
    (status, Json(body))
}

/// Demo page. Without `url` only the form is shown.
#[get("/?<url>&<theme>")]
async fn index(state: &State<AppState>, url: Option<String>, theme: Option<String>) -> RawHtml<String> {
    let display = &state.config.display;
    let theme = theme
        .as_deref()
        .and_then(|t| t.parse::<Theme>().ok())
        .unwrap_or(display.theme);
    let input_url = url.unwrap_or_default();

    let outcome = if input_url.is_empty() {
        None
    } else {
        Some(state.client.fetch(&input_url).await)
    };
    let page_state = match &outcome {
        None => PageState::Empty,
        Some(Ok(report)) => PageState::Loaded(report),
        Some(Err(FetchFailure::InvalidUrl(e))) => PageState::Invalid(e.to_string()),
        Some(Err(failure)) => PageState::Failed {
            message: failure.to_string(),
            metadata: failure.metadata(),
        },
    };

    RawHtml(render_page(
        display,
        &PageContext {
            theme,
            input_url: &input_url,
            mock_mode: state.client.is_mock(),
            state: page_state,
        },
    ))
}

/// JSON form of a fetch: raw payload, canonical feed, call metadata and the original XML.
#[get("/api/v1/feed?<url>")]
async fn feed(state: &State<AppState>, url: Option<String>) -> Result<Json<FeedResponse>, ApiError> {
    let url = url.unwrap_or_default();
    let report = state.client.fetch(&url).await.map_err(api_error)?;
    let display = &state.config.display;
    let formatted_xml = report
        .original_xml
        .as_deref()
        .map(|xml| XmlFormatter::new(display.xml_indent, display.xml_max_bytes).format(xml));
    Ok(Json(FeedResponse { report, formatted_xml }))
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds();
    let endpoints = state.client.endpoints();

    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        mock_mode: state.client.is_mock(),
        primary_endpoint: endpoints.rss2json.to_string(),
        relay_endpoint: endpoints.relay.to_string(),
    })
}

/// Build a Rocket instance bound to `[server]` from the configuration.
pub fn build_rocket(state: AppState) -> Rocket<Build> {
    let fig = rocket::Config::figment()
        .merge(("address", state.config.server.bind.clone()))
        .merge(("port", state.config.server.port));

    rocket::custom(fig)
        .manage(state)
        .mount("/", routes![index, feed, health, status])
}

/// Build and launch the Rocket server; returns once it shuts down.
pub async fn launch_rocket(config: Arc<Config>) -> Result<()> {
    let state = AppState::new(config)?;
    if state.client.is_mock() {
        tracing::info!("demo mode: serving mock feeds, no upstream calls");
    }

    tracing::info!("Starting Rocket HTTP server");
    build_rocket(state)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
