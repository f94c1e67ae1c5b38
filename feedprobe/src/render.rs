//! Server-side HTML for the demo page.
//!
//! Everything the page depends on (theme, limits, the fetch outcome) comes
//! in through `DisplayConfig` and `PageContext`; nothing is read from
//! ambient state.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use common::{ApiCallMetadata, CanonicalFeed, DisplayConfig, Theme};
use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::Html;
use url::{form_urlencoded, Url};

use crate::fetch::FeedReport;
use crate::xml_format::XmlFormatter;

const STYLE: &str = include_str!("../static/style.css");

pub const EXAMPLE_FEEDS: [(&str, &str); 4] = [
    ("BBC News", "https://feeds.bbci.co.uk/news/rss.xml"),
    ("NY Times US", "https://rss.nytimes.com/services/xml/rss/nyt/US.xml"),
    ("TechCrunch", "https://techcrunch.com/feed/"),
    ("Demo feed", "https://example.com/demo.rss"),
];

pub enum PageState<'a> {
    /// Nothing requested yet.
    Empty,
    /// Input rejected before any network call.
    Invalid(String),
    Failed {
        message: String,
        metadata: Option<&'a ApiCallMetadata>,
    },
    Loaded(&'a FeedReport),
}

pub struct PageContext<'a> {
    pub theme: Theme,
    pub input_url: &'a str,
    pub mock_mode: bool,
    pub state: PageState<'a>,
}

/// `/?url=...&theme=...`
pub fn page_href(url: Option<&str>, theme: Theme) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(url) = url {
        query.append_pair("url", url);
    }
    query.append_pair("theme", theme.as_str());
    format!("/?{}", query.finish())
}

pub fn render_page(display: &DisplayConfig, page: &PageContext<'_>) -> String {
    let theme = page.theme;
    let current_url = (!page.input_url.is_empty()).then_some(page.input_url);
    let (toggle_label, toggle_title) = match theme {
        Theme::Dark => ("☀️ Light Mode", "Switch to light mode"),
        Theme::Light => ("🌙 Dark Mode", "Switch to dark mode"),
    };

    let mut out = String::with_capacity(16 * 1024);
    out.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>RSS to JSON API Demo</title>\n<style>\n{}</style>\n</head>\n<body>\n<div class=\"container\">\n",
        theme, STYLE
    ));
    out.push_str(&format!(
        "<header><h1>🌐 RSS to JSON API Demo</h1><a id=\"themeToggle\" class=\"theme-toggle\" href=\"{}\" title=\"{}\">{}</a></header>\n",
        encode_double_quoted_attribute(&page_href(current_url, theme.toggled())),
        toggle_title,
        toggle_label
    ));
    out.push_str(&format!(
        "<form method=\"get\" action=\"/\">\
         <input type=\"text\" id=\"rssUrl\" name=\"url\" placeholder=\"https://example.com/feed.xml\" value=\"{}\">\
         <input type=\"hidden\" name=\"theme\" value=\"{}\">\
         <button id=\"fetchButton\" type=\"submit\">🔄 Fetch RSS Feed</button></form>\n",
        encode_double_quoted_attribute(page.input_url),
        theme
    ));

    out.push_str("<div class=\"examples\">Try: ");
    for (label, url) in EXAMPLE_FEEDS {
        out.push_str(&format!(
            "<a href=\"{}\">{}</a>",
            encode_double_quoted_attribute(&page_href(Some(url), theme)),
            label
        ));
    }
    out.push_str("</div>\n");

    if page.mock_mode {
        out.push_str("<div class=\"notice\">Demo mode: feeds are served from canned mock data.</div>\n");
    }

    match &page.state {
        PageState::Empty => {}
        PageState::Invalid(message) => push_error(&mut out, message),
        PageState::Failed { message, metadata } => {
            if let Some(metadata) = metadata {
                push_api_details(&mut out, metadata);
            }
            push_error(&mut out, message);
        }
        PageState::Loaded(report) => push_results(&mut out, display, report),
    }

    out.push_str("</div>\n</body>\n</html>\n");
    out
}

fn push_error(out: &mut String, message: &str) {
    out.push_str(&format!(
        "<div id=\"errorMessage\" class=\"error-message\">❌ Error: {}</div>\n",
        encode_text(message)
    ));
}

fn push_results(out: &mut String, display: &DisplayConfig, report: &FeedReport) {
    out.push_str("<section id=\"resultSection\">\n");
    push_api_details(out, &report.metadata);
    push_feed_info(out, &report.feed);
    push_items(out, display, &report.feed);

    let json = serde_json::to_string_pretty(&report.raw).unwrap_or_else(|_| report.raw.to_string());
    out.push_str(&format!(
        "<h3>📄 JSON Response</h3>\n<pre id=\"jsonDisplay\">{}</pre>\n",
        encode_text(&json)
    ));

    out.push_str("<h3>📡 Original RSS XML</h3>\n");
    match &report.original_xml {
        Some(xml) => {
            let formatter = XmlFormatter::new(display.xml_indent, display.xml_max_bytes);
            out.push_str(&format!(
                "<pre id=\"rssDisplay\">{}</pre>\n",
                encode_text(&formatter.format(xml))
            ));
        }
        None => out.push_str(
            "<div id=\"rssDisplay\" class=\"notice\">Original RSS XML not available<br><br>\
             In demo mode or due to CORS restrictions.</div>\n",
        ),
    }
    out.push_str("</section>\n");
}

fn push_api_details(out: &mut String, meta: &ApiCallMetadata) {
    let status_class = if meta.is_success_status() {
        "api-status-success"
    } else {
        "api-status-error"
    };
    let status = meta
        .http_status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let response_time = meta
        .response_time_ms
        .map(|ms| format!("{ms}ms"))
        .unwrap_or_else(|| "N/A".to_string());

    out.push_str("<div id=\"apiDetails\" class=\"api-details\">\n<h3>🔧 API Call Details</h3>\n");
    push_detail_row(out, "Request URL:", &encode_text(&meta.request_url), "");
    push_detail_row(out, "API Endpoint:", &encode_text(meta.api_endpoint.as_deref().unwrap_or("N/A")), "");
    push_detail_row(out, "Service:", &encode_text(meta.service_name.as_deref().unwrap_or("Unknown")), "");
    push_detail_row(
        out,
        "HTTP Status:",
        &format!("<span class=\"{status_class}\">{status}</span>"),
        "",
    );
    push_detail_row(out, "Response Time:", &response_time, "api-timing");
    push_detail_row(
        out,
        "Request Time:",
        &meta.requested_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        "",
    );
    if !meta.request_headers.is_empty() {
        push_detail_row(out, "Request Headers:", &encode_text(&meta.headers_line()), "");
    }
    if meta.fallback_used {
        push_detail_row(out, "Fallback Used:", "✅ Yes (Primary service failed)", "api-status-success");
    }
    if meta.mock_data {
        push_detail_row(out, "Demo Mode:", "✅ Using mock data", "api-status-success");
    }
    if let Some(error) = &meta.error {
        push_detail_row(out, "Error:", &encode_text(error), "api-status-error");
    }
    out.push_str("</div>\n");
}

/// `value` must already be escaped.
fn push_detail_row(out: &mut String, label: &str, value: &str, class: &str) {
    out.push_str(&format!(
        "<div class=\"api-detail-row\"><div class=\"api-detail-label\">{label}</div>\
         <div class=\"api-detail-value {class}\">{value}</div></div>\n"
    ));
}

fn push_feed_info(out: &mut String, feed: &CanonicalFeed) {
    if !feed.has_header() {
        return;
    }
    let title = feed.title.as_deref().filter(|t| !t.is_empty()).unwrap_or("RSS Feed");
    let description = feed
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or("No description available");
    out.push_str(&format!(
        "<div id=\"feedInfo\" class=\"feed-info\"><strong>📰 {}</strong><br>{}",
        encode_text(title),
        encode_text(description)
    ));
    if let Some(link) = feed.link.as_deref().filter(|l| !l.is_empty()) {
        if is_web_link(link) {
            out.push_str(&format!(
                "<br>🔗 <a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
                encode_double_quoted_attribute(link),
                encode_text(link)
            ));
        } else {
            out.push_str(&format!("<br>🔗 {}", encode_text(link)));
        }
    }
    out.push_str("</div>\n");
}

fn push_items(out: &mut String, display: &DisplayConfig, feed: &CanonicalFeed) {
    let entries = feed.entries();
    out.push_str("<div id=\"feedItems\">\n");
    if entries.is_empty() {
        out.push_str("<p class=\"notice\">No feed items found.</p>\n</div>\n");
        return;
    }

    out.push_str(&format!("<h3>📋 Latest Articles ({} items)</h3>\n", entries.len()));
    for entry in entries.iter().take(display.max_items) {
        out.push_str(&format!(
            "<div class=\"feed-item\"><div class=\"item-title\">{}</div>\
             <div class=\"item-date\">📅 {}</div>\
             <div class=\"item-description\">{}</div>",
            encode_text(&entry.title),
            encode_text(&format_pub_date(entry.published_at.as_deref())),
            encode_text(&clean_description(&entry.description, display.description_chars))
        ));
        match entry.link.as_deref() {
            Some(link) if is_web_link(link) => out.push_str(&format!(
                "<div class=\"item-link\"><a href=\"{}\" target=\"_blank\" rel=\"noopener\">🔗 Read more →</a></div>",
                encode_double_quoted_attribute(link)
            )),
            Some(link) => out.push_str(&format!("<div class=\"item-link\">🔗 {}</div>", encode_text(link))),
            None => {}
        }
        out.push_str("</div>\n");
    }
    if entries.len() > display.max_items {
        out.push_str(&format!(
            "<div class=\"more-items\">... and {} more items (showing first {})</div>\n",
            entries.len() - display.max_items,
            display.max_items
        ));
    }
    out.push_str("</div>\n");
}

/// Only http(s) links from a feed become anchors.
fn is_web_link(link: &str) -> bool {
    Url::parse(link).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Text content of an HTML fragment.
pub fn strip_html(html: &str) -> String {
    Html::parse_fragment(html).root_element().text().collect()
}

/// Strips markup and keeps the first `limit` characters; "..." marks a cut.
pub fn clean_description(description: &str, limit: usize) -> String {
    let mut cleaned: String = strip_html(description).chars().take(limit).collect();
    if description.chars().count() > limit {
        cleaned.push_str("...");
    }
    cleaned
}

/// RFC 3339, RFC 2822 or `YYYY-MM-DD HH:MM:SS` (rss2json), shown in UTC.
/// Unparseable values are shown as sent.
pub fn format_pub_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "No Date".to_string();
    };
    parse_pub_date(raw)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|at| at.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
}
