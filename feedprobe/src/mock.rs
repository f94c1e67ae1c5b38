//! Canned feed served in demo mode, as rss2json-style JSON and as RSS XML.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{json, Value};

pub const SAMPLE_FEED_NAME: &str = "Sample RSS Feed";

/// URL marker -> feed name, first match wins.
const FEED_MARKERS: [(&str, &str); 4] = [
    ("bbc", "BBC News"),
    ("nytimes", "NY Times US News"),
    ("techcrunch", "TechCrunch"),
    ("demo.rss", "Demo RSS Feed - API Testing Examples"),
];

struct MockArticle {
    title: &'static str,
    description: &'static str,
    link: &'static str,
    age_minutes: i64,
}

const ARTICLES: [MockArticle; 5] = [
    MockArticle {
        title: "Breaking: Major Technology Breakthrough Announced",
        description: "Scientists have made a significant breakthrough in quantum computing technology that could revolutionize how we process information. This development promises to accelerate computational speeds by orders of magnitude.",
        link: "https://example.com/article1",
        age_minutes: 30,
    },
    MockArticle {
        title: "Global Climate Summit Reaches Historic Agreement",
        description: "World leaders have reached a groundbreaking consensus on climate action during the latest international summit. The agreement includes ambitious targets for carbon reduction and renewable energy adoption.",
        link: "https://example.com/article2",
        age_minutes: 2 * 60,
    },
    MockArticle {
        title: "New Study Reveals Surprising Health Benefits",
        description: "Researchers have discovered unexpected health benefits from a common daily activity. The long-term study involving thousands of participants shows promising results for overall wellbeing.",
        link: "https://example.com/article3",
        age_minutes: 4 * 60,
    },
    MockArticle {
        title: "Space Exploration Mission Launches Successfully",
        description: "The latest space mission has launched successfully, carrying advanced scientific instruments to explore distant planets. The mission aims to gather crucial data about potential life beyond Earth.",
        link: "https://example.com/article4",
        age_minutes: 6 * 60,
    },
    MockArticle {
        title: "Economic Markets Show Strong Recovery Signs",
        description: "Financial markets are displaying robust recovery indicators following recent global events. Analysts are optimistic about sustained growth in key sectors throughout the coming quarter.",
        link: "https://example.com/article5",
        age_minutes: 8 * 60,
    },
];

impl MockArticle {
    fn published(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::minutes(self.age_minutes)
    }
}

pub fn feed_name(rss_url: &str) -> &'static str {
    FEED_MARKERS
        .iter()
        .find(|(marker, _)| rss_url.contains(marker))
        .map(|(_, name)| *name)
        .unwrap_or(SAMPLE_FEED_NAME)
}

/// Strips the first `/rss.xml`, then the first `/feed/`. Not URL normalization.
pub fn feed_link(rss_url: &str) -> String {
    rss_url.replacen("/rss.xml", "", 1).replacen("/feed/", "", 1)
}

fn feed_description(name: &str) -> String {
    format!("Latest news and updates from {name} - This is mock data for demonstration purposes")
}

/// `Sun, 18 Oct 2026 12:00:00 GMT`
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn mock_feed_json(rss_url: &str, now: DateTime<Utc>) -> Value {
    let name = feed_name(rss_url);
    let initial = name.chars().next().map(String::from).unwrap_or_default();
    let items: Vec<Value> = ARTICLES
        .iter()
        .map(|article| {
            json!({
                "title": article.title,
                "pubDate": article.published(now).to_rfc3339_opts(SecondsFormat::Millis, true),
                "description": article.description,
                "link": article.link,
            })
        })
        .collect();

    json!({
        "status": "ok",
        "feed": {
            "title": name,
            "description": feed_description(name),
            "link": feed_link(rss_url),
            "image": format!("https://via.placeholder.com/100x100?text={initial}"),
        },
        "items": items,
    })
}

pub fn mock_rss_xml(rss_url: &str, now: DateTime<Utc>) -> Result<String> {
    let name = feed_name(rss_url);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:content", "http://purl.org/rss/1.0/modules/content/"));
    rss.push_attribute(("xmlns:wfw", "http://wellformedweb.org/CommentAPI/"));
    rss.push_attribute(("xmlns:dc", "http://purl.org/dc/elements/1.1/"));
    rss.push_attribute(("xmlns:atom", "http://www.w3.org/2005/Atom"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_text_element(&mut writer, "title", name)?;
    write_text_element(&mut writer, "description", &feed_description(name))?;
    write_text_element(&mut writer, "link", &feed_link(rss_url))?;
    write_text_element(&mut writer, "lastBuildDate", &http_date(now))?;
    write_text_element(&mut writer, "language", "en-US")?;

    let mut self_link = BytesStart::new("atom:link");
    self_link.push_attribute(("href", rss_url));
    self_link.push_attribute(("rel", "self"));
    self_link.push_attribute(("type", "application/rss+xml"));
    writer.write_event(Event::Empty(self_link))?;

    for article in &ARTICLES {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        write_text_element(&mut writer, "title", article.title)?;
        write_text_element(&mut writer, "description", article.description)?;
        write_text_element(&mut writer, "link", article.link)?;
        write_text_element(&mut writer, "pubDate", &http_date(article.published(now)))?;
        write_text_element(&mut writer, "guid", article.link)?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    String::from_utf8(writer.into_inner()).context("mock RSS document is not valid UTF-8")
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Both renditions of the canned feed, generated at the same instant.
#[derive(Debug, Clone)]
pub struct MockFeed {
    pub json: Value,
    pub xml: Option<String>,
}

impl MockFeed {
    pub fn generate(rss_url: &str) -> Self {
        Self::generate_at(rss_url, Utc::now())
    }

    pub fn generate_at(rss_url: &str, now: DateTime<Utc>) -> Self {
        let xml = match mock_rss_xml(rss_url, now) {
            Ok(xml) => Some(xml),
            Err(e) => {
                tracing::warn!("mock: failed to build RSS document: {:#}", e);
                None
            }
        };
        Self {
            json: mock_feed_json(rss_url, now),
            xml,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).single().expect("valid date")
    }

    #[test]
    fn feed_name_follows_marker_priority() {
        assert_eq!(feed_name("https://feeds.bbci.co.uk/news/rss.xml"), "BBC News");
        assert_eq!(feed_name("https://feeds.bbc.co.uk/news/rss.xml"), "BBC News");
        assert_eq!(feed_name("https://rss.nytimes.com/services/xml/rss/nyt/US.xml"), "NY Times US News");
        assert_eq!(feed_name("https://techcrunch.com/feed/"), "TechCrunch");
        assert_eq!(feed_name("https://example.com/demo.rss"), "Demo RSS Feed - API Testing Examples");
        assert_eq!(feed_name("https://bbc.techcrunch.com/"), "BBC News");
        assert_eq!(feed_name("https://example.org/atom"), SAMPLE_FEED_NAME);
    }

    #[test]
    fn feed_link_strips_first_occurrences_only() {
        assert_eq!(feed_link("https://techcrunch.com/feed/"), "https://techcrunch.com");
        assert_eq!(feed_link("https://bbc.co.uk/news/rss.xml"), "https://bbc.co.uk/news");
        assert_eq!(
            feed_link("https://x.com/rss.xml/rss.xml/feed/feed/"),
            "https://x.com/rss.xmlfeed/"
        );
    }

    #[test]
    fn json_items_are_relative_to_generation_time() {
        let feed = mock_feed_json("https://techcrunch.com/feed/", fixed_now());
        assert_eq!(feed["status"], "ok");
        assert_eq!(feed["feed"]["title"], "TechCrunch");
        assert_eq!(feed["feed"]["link"], "https://techcrunch.com");
        assert_eq!(feed["feed"]["image"], "https://via.placeholder.com/100x100?text=T");

        let items = feed["items"].as_array().expect("items array");
        assert_eq!(items.len(), 5);
        assert_eq!(items[0]["pubDate"], "2026-10-18T11:30:00.000Z");
        assert_eq!(items[4]["pubDate"], "2026-10-18T04:00:00.000Z");
        assert_eq!(items[2]["link"], "https://example.com/article3");
    }

    #[test]
    fn xml_document_has_channel_and_items() {
        let xml = mock_rss_xml("https://feeds.bbc.co.uk/news/rss.xml", fixed_now()).expect("xml");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert_eq!(xml.matches("<channel>").count(), 1);
        assert_eq!(xml.matches("<item>").count(), 5);
        assert_eq!(xml.matches("<guid>").count(), 5);
        assert!(xml.contains("<title>BBC News</title>"));
        assert!(xml.contains("<link>https://feeds.bbc.co.uk/news</link>"));
        assert!(xml.contains("<lastBuildDate>Sun, 18 Oct 2026 12:00:00 GMT</lastBuildDate>"));
        assert!(xml.contains("<pubDate>Sun, 18 Oct 2026 11:30:00 GMT</pubDate>"));
        assert!(xml.contains("<pubDate>Sun, 18 Oct 2026 04:00:00 GMT</pubDate>"));
        assert!(xml.contains("rel=\"self\""));
    }

    #[test]
    fn xml_escapes_requested_url() {
        let xml = mock_rss_xml("https://x.com/feed?a=1&b=2", fixed_now()).expect("xml");
        assert!(xml.contains("a=1&amp;b=2"));
        assert!(!xml.contains("a=1&b=2"));
    }

    #[test]
    fn generate_pairs_json_and_xml() {
        let mock = MockFeed::generate_at("https://example.com/demo.rss", fixed_now());
        let xml = mock.xml.expect("xml present");
        for item in mock.json["items"].as_array().expect("items") {
            let title = item["title"].as_str().expect("title");
            assert!(xml.contains(title));
        }
    }

    #[test]
    fn generations_differ_only_by_elapsed_time() {
        let url = "https://feeds.bbci.co.uk/news/rss.xml";
        let gap = Duration::milliseconds(1_250);
        let first = MockFeed::generate_at(url, fixed_now());
        let second = MockFeed::generate_at(url, fixed_now() + gap);
        assert_eq!(first.json["feed"], second.json["feed"]);

        let items = |mock: &MockFeed| mock.json["items"].as_array().cloned().expect("items");
        let published = |item: &Value| {
            DateTime::parse_from_rfc3339(item["pubDate"].as_str().expect("pubDate"))
                .expect("rfc3339 pubDate")
                .with_timezone(&Utc)
        };
        let (earlier, later) = (items(&first), items(&second));
        assert_eq!(earlier.len(), 5);
        assert_eq!(earlier.len(), later.len());

        for (a, b) in earlier.iter().zip(&later) {
            assert_eq!(a["title"], b["title"]);
            assert_eq!(a["description"], b["description"]);
            assert_eq!(a["link"], b["link"]);
            assert_eq!(published(b) - published(a), gap);
        }
        // newest first
        for pair in earlier.windows(2) {
            assert!(published(&pair[0]) > published(&pair[1]));
        }
    }
}
