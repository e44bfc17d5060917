use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db;
use crate::fetch::Fetch;
use crate::normalize;
use crate::paginator;

// Per-run crawl state, passed explicitly through the loop.
#[derive(Debug, Clone)]
pub struct CrawlSession {
    pub max_pages: u32,
    pub fetched_at: String,
}

impl CrawlSession {
    pub fn new(max_pages: u32) -> Self {
        Self {
            max_pages,
            fetched_at: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct ListStats {
    pub pages: u32,
    pub stored: u64,
    pub store_failures: u64,
    pub abandoned: bool,
}

#[derive(Debug, Default, PartialEq)]
pub struct RunStats {
    pub lists: u32,
    pub abandoned_lists: u32,
    pub pages: u32,
    pub stored: u64,
    pub store_failures: u64,
}

// One listing endpoint, crawled strictly in page order: fetch a page,
// normalize and store every item on it, then decide whether to continue.
// A fetch or decode failure abandons the list; pagination also ends when
// the listing stops returning a cursor or the page budget is spent.
pub async fn crawl_list<F: Fetch>(
    conn: &Connection,
    fetcher: &F,
    session: &CrawlSession,
    list_url: &str,
) -> ListStats {
    let mut stats = ListStats::default();
    let mut cursor: Option<String> = None;

    while stats.pages < session.max_pages {
        let page = match paginator::fetch_page(fetcher, list_url, cursor.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    list = list_url,
                    page = stats.pages + 1,
                    error = %e,
                    "abandoning list"
                );
                stats.abandoned = true;
                break;
            }
        };
        stats.pages += 1;

        for raw in &page.items {
            let post = normalize::normalize(raw);

            match db::upsert_post(conn, &post, &session.fetched_at) {
                Ok(()) => stats.stored += 1,
                Err(e) => {
                    stats.store_failures += 1;
                    warn!(
                        list = list_url,
                        page = stats.pages,
                        id = post.id.as_deref().unwrap_or("?"),
                        error = %e,
                        "failed to store post"
                    );
                }
            }
        }

        info!(
            list = list_url,
            page = stats.pages,
            items = page.items.len(),
            "processed listing page"
        );

        match page.after {
            Some(after) => cursor = Some(after),
            None => break,
        }
    }

    stats
}

// Lists run to completion one at a time; a failed list yields fewer records
// but never aborts the rest of the run.
pub async fn crawl_all<F: Fetch>(
    conn: &Connection,
    fetcher: &F,
    session: &CrawlSession,
    lists: &[String],
) -> RunStats {
    let mut run = RunStats::default();

    for list_url in lists {
        let stats = crawl_list(conn, fetcher, session, list_url).await;

        run.lists += 1;
        if stats.abandoned {
            run.abandoned_lists += 1;
        }
        run.pages += stats.pages;
        run.stored += stats.stored;
        run.store_failures += stats.store_failures;
    }

    run
}
