use chrono::DateTime;
use serde_json::Value;
use url::Url;

use crate::paginator::RawPost;

// Permalinks arrive site-relative and are stored absolute.
pub const SITE_ORIGIN: &str = "https://www.reddit.com";

// Flat row shape matching the posts table. Every source field is optional;
// a missing or unconvertible value becomes None, never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Option<String>,
    pub parent_list: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<String>,
    pub edited_at: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub permalink: Option<String>,
    pub score: Option<i64>,
    pub upvote_ratio: Option<f64>,
    pub comment_count: Option<i64>,
    pub link_flair_text: Option<String>,
    pub thumbnail: Option<String>,
    pub media: Option<String>,
    pub media_metadata: Option<String>,
    pub preview: Option<String>,
    pub gallery_data: Option<String>,
}

pub fn normalize(raw: &RawPost) -> Post {
    let permalink = raw
        .get("permalink")
        .and_then(Value::as_str)
        .map(|path| absolutize(SITE_ORIGIN, path));

    Post {
        id: text(raw.get("id")),
        parent_list: permalink.as_deref().and_then(parent_list_from_permalink),
        author: text(raw.get("author")),
        created_at: timestamp(raw.get("created_utc")),
        edited_at: timestamp(raw.get("edited")),
        title: text(raw.get("title")),
        body: text(raw.get("selftext")),
        permalink,
        score: raw.get("score").and_then(Value::as_i64),
        upvote_ratio: raw.get("upvote_ratio").and_then(Value::as_f64),
        comment_count: raw.get("num_comments").and_then(Value::as_i64),
        link_flair_text: text(raw.get("link_flair_text")),
        thumbnail: text(raw.get("thumbnail")),
        media: opaque(raw.get("media")),
        media_metadata: opaque(raw.get("media_metadata")),
        preview: opaque(raw.get("preview")),
        gallery_data: opaque(raw.get("gallery_data")),
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

// Media and preview shapes vary per post; they are stored as opaque JSON
// text and must round-trip to an equivalent structure on decode.
fn opaque(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(nested) => serde_json::to_string(nested).ok(),
    }
}

// Source timestamps are seconds since the epoch, int or float. An exact
// zero means "no timestamp" upstream and passes through unconverted.
fn timestamp(value: Option<&Value>) -> Option<String> {
    let seconds = value?.as_f64()?;

    if seconds == 0.0 {
        return Some("0".to_string());
    }

    DateTime::from_timestamp(seconds as i64, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

fn absolutize(origin: &str, permalink: &str) -> String {
    if let Ok(url) = Url::parse(permalink) {
        return url.to_string();
    }

    match Url::parse(origin).and_then(|base| base.join(permalink)) {
        Ok(joined) => joined.to_string(),
        Err(_) => permalink.to_string(),
    }
}

// The collection name is the path segment after the literal "r" marker,
// e.g. https://.../r/rust/comments/... -> "rust".
fn parent_list_from_permalink(permalink: &str) -> Option<String> {
    let url = Url::parse(permalink).ok()?;
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    if segments.len() >= 3 && segments[0].eq_ignore_ascii_case("r") {
        return Some(segments[1].to_string());
    }

    None
}
