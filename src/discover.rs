use anyhow::Result;
use scraper::{Html, Selector};
use tracing::info;
use url::Url;

use crate::config::DiscoverConfig;
use crate::fetch::Fetch;

// One directory page worth of listing links, plus the "more" link if any.
struct DirectoryPage {
    listings: Vec<String>,
    next: Option<String>,
}

// Walk the site's subreddit directory and collect listing endpoints for the
// seed table. Bounded by the same page budget as the crawl itself.
pub async fn discover_listings<F: Fetch>(
    fetcher: &F,
    cfg: &DiscoverConfig,
    max_pages: u32,
) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    let mut page_url = cfg.directory_url.clone();
    let mut pages = 0;

    while pages < max_pages {
        let body = fetcher.fetch(&page_url).await?;
        let page = parse_directory(&page_url, &cfg.listing_suffix, &body);
        pages += 1;

        info!(
            url = %page_url,
            page = pages,
            found = page.listings.len(),
            "scanned directory page"
        );
        urls.extend(page.listings);

        match page.next {
            Some(next) => page_url = next,
            None => break,
        }
    }

    Ok(urls)
}

fn parse_directory(base_url: &str, listing_suffix: &str, body: &str) -> DirectoryPage {
    let document = Html::parse_document(body);
    let title_selector = Selector::parse("div.sitetable div.entry p.titlerow a.title").unwrap();
    let more_selector = Selector::parse("a#sr-more-link").unwrap();

    let mut listings = Vec::new();
    for element in document.select(&title_selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(absolute) = resolve(base_url, href) {
                listings.push(with_suffix(&absolute, listing_suffix));
            }
        }
    }

    let next = document
        .select(&more_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve(base_url, href));

    DirectoryPage { listings, next }
}

fn resolve(base: &str, href: &str) -> Option<String> {
    let base_url = Url::parse(base).ok()?;
    base_url.join(href).ok().map(|joined| joined.to_string())
}

fn with_suffix(url: &str, suffix: &str) -> String {
    format!(
        "{}/{}",
        url.trim_end_matches('/'),
        suffix.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const DIRECTORY: &str = "https://www.reddit.com/subreddits/";

    const PAGE_ONE: &str = r#"
        <html><body>
        <div class="sitetable">
            <div class="entry">
                <p class="titlerow"><a class="title" href="/r/rust/">r/rust</a></p>
                <span class="number">1,234,567</span>
            </div>
            <div class="entry">
                <p class="titlerow"><a class="title" href="https://www.reddit.com/r/AskUK/">r/AskUK</a></p>
            </div>
        </div>
        <a id="sr-more-link" href="/subreddits/?count=25&amp;after=t5_abc">more</a>
        </body></html>
    "#;

    const PAGE_TWO: &str = r#"
        <html><body>
        <div class="sitetable">
            <div class="entry">
                <p class="titlerow"><a class="title" href="/r/science/">r/science</a></p>
            </div>
        </div>
        </body></html>
    "#;

    struct CannedFetcher {
        bodies: HashMap<String, String>,
        calls: Mutex<usize>,
    }

    impl Fetch for CannedFetcher {
        async fn fetch(&self, url: &str) -> anyhow::Result<String> {
            *self.calls.lock().unwrap() += 1;
            match self.bodies.get(url) {
                Some(body) => Ok(body.clone()),
                None => anyhow::bail!("no canned body for {url}"),
            }
        }
    }

    fn cfg() -> DiscoverConfig {
        DiscoverConfig {
            directory_url: DIRECTORY.to_string(),
            listing_suffix: "new/".to_string(),
        }
    }

    #[test]
    fn extracts_listing_links_with_suffix() {
        let page = parse_directory(DIRECTORY, "new/", PAGE_ONE);

        assert_eq!(
            page.listings,
            vec![
                "https://www.reddit.com/r/rust/new/",
                "https://www.reddit.com/r/AskUK/new/",
            ]
        );
        assert_eq!(
            page.next.as_deref(),
            Some("https://www.reddit.com/subreddits/?count=25&after=t5_abc")
        );
    }

    #[test]
    fn page_without_links_is_empty_not_an_error() {
        let page = parse_directory(DIRECTORY, "new/", "<html><body>nothing here</body></html>");
        assert!(page.listings.is_empty());
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn follows_more_link_within_budget() {
        let fetcher = CannedFetcher {
            bodies: HashMap::from([
                (DIRECTORY.to_string(), PAGE_ONE.to_string()),
                (
                    "https://www.reddit.com/subreddits/?count=25&after=t5_abc".to_string(),
                    PAGE_TWO.to_string(),
                ),
            ]),
            calls: Mutex::new(0),
        };

        let urls = discover_listings(&fetcher, &cfg(), 5).await.unwrap();

        assert_eq!(*fetcher.calls.lock().unwrap(), 2);
        assert_eq!(
            urls,
            vec![
                "https://www.reddit.com/r/rust/new/",
                "https://www.reddit.com/r/AskUK/new/",
                "https://www.reddit.com/r/science/new/",
            ]
        );
    }

    #[tokio::test]
    async fn budget_stops_directory_pagination() {
        let fetcher = CannedFetcher {
            bodies: HashMap::from([(DIRECTORY.to_string(), PAGE_ONE.to_string())]),
            calls: Mutex::new(0),
        };

        let urls = discover_listings(&fetcher, &cfg(), 1).await.unwrap();

        assert_eq!(*fetcher.calls.lock().unwrap(), 1);
        assert_eq!(urls.len(), 2);
    }
}
