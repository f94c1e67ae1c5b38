/*
 * End-to-end verification binary for feedprobe
 *
 * Talks to a running server (start it with `feedprobe --mock` for an offline run).
 *
 * Steps:
 * 1. Health check
 * 2. Status endpoint
 * 3. Fetch a feed through the JSON API
 * 4. Check that invalid URLs are rejected
 * 5. Render the demo page
 */

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;

const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
const TEST_FEED_URL: &str = "https://feeds.bbci.co.uk/news/rss.xml";

#[tokio::main]
async fn main() -> Result<()> {
    let server = std::env::var("FEEDPROBE_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
    let client = Client::new();

    println!("\n{}", "=".repeat(60));
    println!("feedprobe End-to-End Verification ({})", server);
    println!("{}\n", "=".repeat(60));

    println!("[1/5] Health check...");
    let health = client
        .get(format!("{}/health", server))
        .send()
        .await
        .context("Server not reachable")?
        .text()
        .await?;
    if health != "OK" {
        anyhow::bail!("Unexpected health response: {}", health);
    }
    println!("   ✓ Server is up");

    println!("[2/5] Status endpoint...");
    let status: Value = client
        .get(format!("{}/api/v1/status", server))
        .send()
        .await?
        .json()
        .await
        .context("Status response is not JSON")?;
    let mock_mode = status["mock_mode"].as_bool().unwrap_or(false);
    println!(
        "   ✓ Uptime {}s, mock mode: {}",
        status["uptime_seconds"].as_i64().unwrap_or(0),
        mock_mode
    );

    println!("[3/5] Fetching {}...", TEST_FEED_URL);
    let response = client
        .get(format!("{}/api/v1/feed", server))
        .query(&[("url", TEST_FEED_URL)])
        .send()
        .await
        .context("Failed to call feed API")?;
    let code = response.status();
    let report: Value = response.json().await.context("Feed response is not JSON")?;
    if !code.is_success() {
        anyhow::bail!("Feed fetch failed ({}): {}", code, report["error"]);
    }
    let metadata = &report["metadata"];
    let items = report["feed"]["items"].as_array().map(Vec::len).unwrap_or(0);
    println!(
        "   ✓ \"{}\" with {} items via {} in {}ms",
        report["feed"]["title"].as_str().unwrap_or("?"),
        items,
        metadata["serviceName"].as_str().unwrap_or("?"),
        metadata["responseTimeMs"]
    );
    if metadata["fallbackUsed"].as_bool() == Some(true) {
        println!("   ⚠️  Primary service failed, fallback was used");
    }
    if mock_mode && metadata["mockData"].as_bool() != Some(true) {
        anyhow::bail!("Server is in mock mode but the report is not flagged as mock data");
    }
    if report["originalXml"].is_null() {
        println!("   ⚠️  Original RSS XML not available");
    }

    println!("[4/5] Rejecting invalid URL...");
    let rejected = client
        .get(format!("{}/api/v1/feed", server))
        .query(&[("url", "ftp://example.com/feed")])
        .send()
        .await?;
    if rejected.status() != StatusCode::BAD_REQUEST {
        anyhow::bail!("Expected 400 for invalid URL, got {}", rejected.status());
    }
    let body: Value = rejected.json().await?;
    println!("   ✓ {}", body["error"].as_str().unwrap_or("rejected"));

    println!("[5/5] Rendering demo page...");
    let page = client
        .get(format!("{}/", server))
        .query(&[("url", TEST_FEED_URL), ("theme", "light")])
        .send()
        .await?
        .text()
        .await?;
    if !page.contains("apiDetails") {
        anyhow::bail!("Demo page does not show API call details");
    }
    println!("   ✓ Page rendered ({} bytes)", page.len());

    println!("\n{}", "=".repeat(60));
    println!("✅ Verification passed");
    println!("{}\n", "=".repeat(60));
    Ok(())
}
