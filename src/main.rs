mod config;
mod crawl;
mod db;
mod discover;
mod export;
mod fetch;
mod normalize;
mod paginator;

use anyhow::Result;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::crawl::CrawlSession;
use crate::fetch::HttpFetcher;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: reddit_meta_crawler <config.json>");
        std::process::exit(1);
    }

    let config = config::load(&args[1])?;
    let session = CrawlSession::new(config.page_budget());

    info!(
        db_path = %config.db_path,
        max_pages = session.max_pages,
        "crawler started"
    );

    // Open SQLite database
    let conn = Connection::open(&config.db_path)?;
    db::init(&conn)?;

    let fetcher = HttpFetcher::new()?;

    // === Seed listing endpoints ===
    let seed_urls: Vec<String> = config.subreddits.iter().map(|s| s.url.clone()).collect();
    let seeded = db::seed_subreddits(&conn, &seed_urls)?;
    info!(configured = seed_urls.len(), seeded, "seeded endpoints from config");

    if let Some(discover_cfg) = &config.discover {
        match discover::discover_listings(&fetcher, discover_cfg, session.max_pages).await {
            Ok(urls) => {
                let seeded = db::seed_subreddits(&conn, &urls)?;
                info!(discovered = urls.len(), seeded, "seeded endpoints from directory");
            }
            Err(e) => warn!(error = %e, "listing discovery failed"),
        }
    }

    // === Crawl ===
    let lists = db::subreddit_urls(&conn)?;
    let stats = crawl::crawl_all(&conn, &fetcher, &session, &lists).await;

    info!(
        lists = stats.lists,
        abandoned = stats.abandoned_lists,
        pages = stats.pages,
        stored = stats.stored,
        store_failures = stats.store_failures,
        "crawl finished"
    );

    // === Export JSON ===
    export::export_json(&conn, &config.export_path)?;
    info!(path = %config.export_path, "exported posts");

    Ok(())
}
