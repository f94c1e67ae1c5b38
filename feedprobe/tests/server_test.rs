use std::sync::Arc;

use common::{Config, DemoConfig};
use feedprobe::server::{build_rocket, AppState};
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use serde_json::Value;

const BBC_QUERY: &str = "url=https%3A%2F%2Ffeeds.bbci.co.uk%2Fnews%2Frss.xml";

async fn client_with(config: Config) -> Client {
    let state = AppState::new(Arc::new(config)).expect("app state");
    Client::tracked(build_rocket(state)).await.expect("valid rocket instance")
}

async fn mock_client() -> Client {
    let mut config = Config::default();
    config.demo = DemoConfig {
        mock_mode: true,
        mock_delay_min_ms: 0,
        mock_delay_max_ms: 0,
    };
    client_with(config).await
}

#[tokio::test]
async fn health_and_status() {
    let client = mock_client().await;

    let health = client.get("/health").dispatch().await;
    assert_eq!(health.status(), Status::Ok);
    assert_eq!(health.into_string().await.as_deref(), Some("OK"));

    let status: Value = client
        .get("/api/v1/status")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("status json");
    assert_eq!(status["status"], "ok");
    assert_eq!(status["mock_mode"], true);
    assert_eq!(status["primary_endpoint"], "https://api.rss2json.com/v1/api.json");
}

#[tokio::test]
async fn feed_api_returns_report() {
    let client = mock_client().await;

    let response = client.get(format!("/api/v1/feed?{}", BBC_QUERY)).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.content_type(), Some(ContentType::JSON));

    let report: Value = response.into_json().await.expect("report json");
    assert_eq!(report["feed"]["title"], "BBC News");
    assert_eq!(report["feed"]["items"].as_array().map(Vec::len), Some(5));
    assert_eq!(report["raw"]["status"], "ok");
    assert_eq!(report["metadata"]["requestUrl"], "https://feeds.bbci.co.uk/news/rss.xml");
    assert_eq!(report["metadata"]["mockData"], true);
    assert_eq!(report["metadata"]["httpStatus"], 200);
    assert_eq!(report["metadata"]["requestHeaders"]["Accept"], "application/json");
    assert!(report["originalXml"].as_str().is_some_and(|xml| xml.contains("<rss")));
    assert!(report["formattedXml"]
        .as_str()
        .is_some_and(|xml| xml.contains("\n  <channel>")));
}

#[tokio::test]
async fn feed_api_rejects_invalid_urls() {
    let client = mock_client().await;

    let missing = client.get("/api/v1/feed").dispatch().await;
    assert_eq!(missing.status(), Status::BadRequest);
    let body: Value = missing.into_json().await.expect("error json");
    assert_eq!(body["error"], "Please enter a valid RSS URL");
    assert!(body.get("metadata").is_none());

    let scheme = client.get("/api/v1/feed?url=ftp%3A%2F%2Fexample.com").dispatch().await;
    assert_eq!(scheme.status(), Status::BadRequest);
    let body: Value = scheme.into_json().await.expect("error json");
    assert_eq!(
        body["error"],
        "Please enter a valid URL (must start with http:// or https://)"
    );
}

#[tokio::test]
async fn feed_api_reports_upstream_failure() {
    let mut config = Config::default();
    config.services.rss2json_url = "http://127.0.0.1:1/v1/api.json".to_string();
    config.services.relay_url = "http://127.0.0.1:1/get".to_string();
    let client = client_with(config).await;

    let response = client
        .get("/api/v1/feed?url=https%3A%2F%2Fnews.example.com%2Frss.xml")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadGateway);

    let body: Value = response.into_json().await.expect("error json");
    assert!(body["error"]
        .as_str()
        .is_some_and(|e| e.starts_with("Failed to fetch RSS feed: ")));
    assert_eq!(body["metadata"]["fallbackUsed"], true);
    assert!(body["metadata"]["error"].is_string());
}

#[tokio::test]
async fn index_renders_form_only_without_url() {
    let client = mock_client().await;

    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.content_type(), Some(ContentType::HTML));

    let html = response.into_string().await.expect("html body");
    assert!(html.contains("RSS to JSON API Demo"));
    assert!(html.contains("data-theme=\"dark\""));
    assert!(html.contains("Demo mode"));
    assert!(!html.contains("resultSection"));
    assert!(!html.contains("errorMessage"));
}

#[tokio::test]
async fn index_renders_feed_with_theme() {
    let client = mock_client().await;

    let html = client
        .get(format!("/?{}&theme=light", BBC_QUERY))
        .dispatch()
        .await
        .into_string()
        .await
        .expect("html body");

    assert!(html.contains("data-theme=\"light\""));
    assert!(html.contains("🌙 Dark Mode"));
    assert!(html.contains("📰 BBC News"));
    assert!(html.contains("Latest Articles (5 items)"));
    assert!(html.contains("Mock Data (Demo Mode)"));
    assert!(html.contains("id=\"rssDisplay\""));
    assert!(!html.contains("more items"));
}

#[tokio::test]
async fn index_shows_validation_error() {
    let client = mock_client().await;

    let html = client
        .get("/?url=example.com%2Ffeed&theme=bogus")
        .dispatch()
        .await
        .into_string()
        .await
        .expect("html body");

    // unknown theme falls back to the configured one
    assert!(html.contains("data-theme=\"dark\""));
    assert!(html.contains("❌ Error: Please enter a valid URL (must start with http:// or https://)"));
    assert!(!html.contains("apiDetails"));
}
