//! Maps the JSON returned by the different RSS-to-JSON providers onto one
//! canonical shape.

use common::feed::{first_text, DEFAULT_FEED_TITLE};
use common::CanonicalFeed;
use serde_json::{Map, Value};

/// Provider payload shapes, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{ feed: {title, description, link}, items: [...] }` (rss2json)
    FeedItems,
    /// `{ title, items, ... }`, already canonical (rsstojson)
    Canonical,
    /// Anything else; best-effort field lookup.
    Generic,
}

impl ResponseShape {
    pub fn detect(raw: &Value) -> Self {
        let has_items = raw.get("items").is_some_and(Value::is_array);
        if has_items && raw.get("feed").is_some_and(Value::is_object) {
            ResponseShape::FeedItems
        } else if has_items && first_text(raw, &["title"]).is_some() {
            ResponseShape::Canonical
        } else {
            ResponseShape::Generic
        }
    }
}

/// Never fails: missing fields degrade to defaults.
pub fn normalize_response(raw: &Value) -> CanonicalFeed {
    let shape = ResponseShape::detect(raw);
    tracing::debug!(?shape, "normalizing provider response");
    match shape {
        ResponseShape::FeedItems => from_feed_items(raw),
        ResponseShape::Canonical => passthrough(raw),
        ResponseShape::Generic => from_generic(raw),
    }
}

fn from_feed_items(raw: &Value) -> CanonicalFeed {
    let feed = &raw["feed"];
    // non-text header values are carried as-is in `extra`
    let mut extra = Map::new();
    let mut text = |key: &str| match feed.get(key) {
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => {
            extra.insert(key.to_string(), other.clone());
            None
        }
        None => None,
    };
    let title = text("title");
    let description = text("description");
    let link = text("link");
    CanonicalFeed {
        title,
        description,
        link,
        items: array_of(raw, "items"),
        extra,
    }
}

fn passthrough(raw: &Value) -> CanonicalFeed {
    let mut fields = raw.as_object().cloned().unwrap_or_default();
    let mut take_text = |key: &str| match fields.remove(key) {
        Some(Value::String(text)) => Some(text),
        Some(other) => {
            fields.insert(key.to_string(), other);
            None
        }
        None => None,
    };
    let title = take_text("title");
    let description = take_text("description");
    let link = take_text("link");
    let items = match fields.remove("items") {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    CanonicalFeed {
        title,
        description,
        link,
        items,
        extra: fields,
    }
}

fn from_generic(raw: &Value) -> CanonicalFeed {
    let items = ["items", "entries"]
        .iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default();
    CanonicalFeed {
        title: Some(first_text(raw, &["title", "name"]).unwrap_or(DEFAULT_FEED_TITLE).to_string()),
        description: Some(first_text(raw, &["description", "subtitle"]).unwrap_or_default().to_string()),
        link: Some(first_text(raw, &["link", "url"]).unwrap_or_default().to_string()),
        items,
        extra: Map::new(),
    }
}

fn array_of(raw: &Value, key: &str) -> Vec<Value> {
    raw.get(key).and_then(Value::as_array).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn feed_items_shape_uses_nested_feed() {
        let raw = json!({
            "status": "ok",
            "feed": {"title": "BBC News", "description": "Latest", "link": "https://bbc.co.uk"},
            "items": [{"title": "a"}, {"title": "b"}]
        });
        assert_eq!(ResponseShape::detect(&raw), ResponseShape::FeedItems);

        let feed = normalize_response(&raw);
        assert_eq!(feed.title.as_deref(), Some("BBC News"));
        assert_eq!(feed.description.as_deref(), Some("Latest"));
        assert_eq!(feed.link.as_deref(), Some("https://bbc.co.uk"));
        assert_eq!(Value::Array(feed.items), raw["items"]);
        assert!(feed.extra.is_empty());
    }

    #[test]
    fn feed_items_shape_keeps_non_text_header_values() {
        let raw = json!({
            "feed": {"title": 42, "description": null, "link": "https://x.com"},
            "items": []
        });
        let feed = normalize_response(&raw);
        assert!(feed.title.is_none());
        assert!(feed.description.is_none());
        assert_eq!(feed.link.as_deref(), Some("https://x.com"));

        let value = serde_json::to_value(&feed).expect("serialize");
        assert_eq!(value["title"], raw["feed"]["title"]);
        assert_eq!(value["description"], Value::Null);
        assert!(value.get("description").is_some());
        assert_eq!(value["link"], raw["feed"]["link"]);
    }

    #[test]
    fn feed_items_shape_wins_over_top_level_title() {
        let raw = json!({"title": "top", "feed": {}, "items": []});
        let feed = normalize_response(&raw);
        assert_eq!(ResponseShape::detect(&raw), ResponseShape::FeedItems);
        assert!(feed.title.is_none());
        assert!(feed.items.is_empty());
    }

    #[test]
    fn canonical_shape_passes_through_unchanged() {
        let raw = json!({
            "title": "Already canonical",
            "link": "https://x.com",
            "items": [{"title": "one", "extra": 1}],
            "generator": "rsstojson",
            "updated": 42
        });
        assert_eq!(ResponseShape::detect(&raw), ResponseShape::Canonical);

        let feed = normalize_response(&raw);
        assert_eq!(serde_json::to_value(&feed).expect("serialize"), raw);
    }

    #[test]
    fn canonical_passthrough_keeps_non_text_fields() {
        let raw = json!({"title": "t", "description": 7, "items": []});
        let feed = normalize_response(&raw);
        assert!(feed.description.is_none());
        assert_eq!(serde_json::to_value(&feed).expect("serialize"), raw);
    }

    #[test]
    fn generic_shape_maps_alternate_fields() {
        let raw = json!({
            "name": "Atom-ish",
            "subtitle": "sub",
            "url": "https://atom.example",
            "entries": [{"title": "e1"}]
        });
        assert_eq!(ResponseShape::detect(&raw), ResponseShape::Generic);

        let feed = normalize_response(&raw);
        assert_eq!(feed.title.as_deref(), Some("Atom-ish"));
        assert_eq!(feed.description.as_deref(), Some("sub"));
        assert_eq!(feed.link.as_deref(), Some("https://atom.example"));
        assert_eq!(feed.items, vec![json!({"title": "e1"})]);
    }

    #[test]
    fn empty_object_gets_defaults() {
        let feed = normalize_response(&json!({}));
        assert_eq!(
            serde_json::to_value(&feed).expect("serialize"),
            json!({"title": "RSS Feed", "description": "", "link": "", "items": []})
        );
    }

    #[test]
    fn non_object_payload_degrades_to_defaults() {
        for raw in [Value::Null, json!("text"), json!([1, 2])] {
            let feed = normalize_response(&raw);
            assert_eq!(feed.title.as_deref(), Some(DEFAULT_FEED_TITLE));
            assert!(feed.items.is_empty());
        }
    }

    #[test]
    fn empty_title_is_not_canonical() {
        let raw = json!({"title": "", "name": "Named", "items": [{"title": "x"}]});
        assert_eq!(ResponseShape::detect(&raw), ResponseShape::Generic);
        let feed = normalize_response(&raw);
        assert_eq!(feed.title.as_deref(), Some("Named"));
        assert_eq!(feed.items.len(), 1);
    }
}
