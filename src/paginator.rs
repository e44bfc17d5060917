use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::fetch::Fetch;

const PAGE_SIZE: u32 = 100;

// One post as returned by the listing endpoint, untyped. The field set
// varies wildly between posts, so flattening is left to the normalizer.
pub type RawPost = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum FetchPageError {
    #[error("fetch failed for {url}: {cause}")]
    Http { url: String, cause: anyhow::Error },
    #[error("undecodable listing payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

// Listing envelope: {"data": {"children": [{"data": {...}}, ...], "after": "t3_..."}}
#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
    #[serde(default)]
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RawPost,
}

#[derive(Debug)]
pub struct Page {
    pub items: Vec<RawPost>,
    // None once the listing reports no further pages
    pub after: Option<String>,
}

// The `after` token is opaque and carried verbatim into the next request.
pub fn page_url(list_url: &str, cursor: Option<&str>) -> String {
    let base = list_url.trim_end_matches('/');

    match cursor {
        Some(after) => format!("{base}.json?after={after}&limit={PAGE_SIZE}"),
        None => format!("{base}.json?limit={PAGE_SIZE}"),
    }
}

pub async fn fetch_page<F: Fetch>(
    fetcher: &F,
    list_url: &str,
    cursor: Option<&str>,
) -> Result<Page, FetchPageError> {
    let url = page_url(list_url, cursor);

    let body = fetcher
        .fetch(&url)
        .await
        .map_err(|cause| FetchPageError::Http {
            url: url.clone(),
            cause,
        })?;

    let envelope: ListingEnvelope =
        serde_json::from_str(&body).map_err(|source| FetchPageError::Decode {
            url: url.clone(),
            source,
        })?;

    let items: Vec<RawPost> = envelope
        .data
        .children
        .into_iter()
        .map(|child| child.data)
        .collect();

    debug!(url = %url, items = items.len(), has_next = envelope.data.after.is_some(), "fetched listing page");

    Ok(Page {
        items,
        after: envelope.data.after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::HashMap;

    struct CannedFetcher {
        bodies: HashMap<String, String>,
    }

    impl Fetch for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            match self.bodies.get(url) {
                Some(body) => Ok(body.clone()),
                None => anyhow::bail!("no canned body for {url}"),
            }
        }
    }

    #[test]
    fn first_page_url_has_no_cursor() {
        assert_eq!(
            page_url("https://www.reddit.com/r/rust/new/", None),
            "https://www.reddit.com/r/rust/new.json?limit=100"
        );
    }

    #[test]
    fn later_page_url_carries_token_verbatim() {
        assert_eq!(
            page_url("https://www.reddit.com/r/rust/new/", Some("t3_1abc2d")),
            "https://www.reddit.com/r/rust/new.json?after=t3_1abc2d&limit=100"
        );
    }

    #[tokio::test]
    async fn decodes_items_and_cursor() {
        let body = r#"{
            "kind": "Listing",
            "data": {
                "children": [
                    {"kind": "t3", "data": {"id": "1abc2d", "title": "first"}},
                    {"kind": "t3", "data": {"id": "1abc2e", "title": "second"}}
                ],
                "after": "t3_1abc2e"
            }
        }"#;
        let fetcher = CannedFetcher {
            bodies: HashMap::from([(
                page_url("https://www.reddit.com/r/rust/new/", None),
                body.to_string(),
            )]),
        };

        let page = fetch_page(&fetcher, "https://www.reddit.com/r/rust/new/", None)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].get("id").unwrap(), "1abc2d");
        assert_eq!(page.after.as_deref(), Some("t3_1abc2e"));
    }

    #[tokio::test]
    async fn null_after_ends_the_list() {
        let body = r#"{"data": {"children": [], "after": null}}"#;
        let fetcher = CannedFetcher {
            bodies: HashMap::from([(
                page_url("https://www.reddit.com/r/rust/new/", None),
                body.to_string(),
            )]),
        };

        let page = fetch_page(&fetcher, "https://www.reddit.com/r/rust/new/", None)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(page.after.is_none());
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let fetcher = CannedFetcher {
            bodies: HashMap::from([(
                page_url("https://www.reddit.com/r/rust/new/", None),
                "<html>rate limited</html>".to_string(),
            )]),
        };

        let err = fetch_page(&fetcher, "https://www.reddit.com/r/rust/new/", None)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchPageError::Decode { .. }));
    }

    #[tokio::test]
    async fn transport_failure_is_an_http_error() {
        let fetcher = CannedFetcher {
            bodies: HashMap::new(),
        };

        let err = fetch_page(&fetcher, "https://www.reddit.com/r/rust/new/", None)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchPageError::Http { .. }));
    }
}
