use rusqlite::{Connection, params};
use serde::Serialize;
use thiserror::Error;

use crate::normalize::Post;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

// Row shape used for export
#[derive(Debug, Serialize)]
pub struct StoredPost {
    pub id: Option<String>,
    pub parent_list: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub permalink: Option<String>,
    pub score: Option<i64>,
    pub upvote_ratio: Option<f64>,
    pub comment_count: Option<i64>,
}

// Initialize database and tables
pub fn init(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;

        -- Normalized listing posts
        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            parent_list TEXT,
            author TEXT,
            created_at TEXT,
            edited_at TEXT,
            title TEXT,
            body TEXT,
            permalink TEXT,
            score INTEGER,
            upvote_ratio REAL,
            comment_count INTEGER,
            link_flair_text TEXT,
            thumbnail TEXT,
            media TEXT,
            media_metadata TEXT,
            preview TEXT,
            gallery_data TEXT,
            fetched_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_posts_created_at
            ON posts (created_at);

        -- Crawlable listing endpoints
        CREATE TABLE IF NOT EXISTS subreddits (
            id INTEGER PRIMARY KEY,
            url TEXT NOT NULL UNIQUE
        );
        ",
    )?;

    Ok(())
}

// Re-surfaced posts replace their previous row wholesale: no duplicate
// rows, no stale column values left over from an earlier crawl.
pub fn upsert_post(conn: &Connection, post: &Post, fetched_at: &str) -> Result<(), StoreError> {
    conn.execute(
        "
        INSERT OR REPLACE INTO posts
        (id, parent_list, author, created_at, edited_at, title, body, permalink,
         score, upvote_ratio, comment_count, link_flair_text, thumbnail,
         media, media_metadata, preview, gallery_data, fetched_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        ",
        params![
            post.id,
            post.parent_list,
            post.author,
            post.created_at,
            post.edited_at,
            post.title,
            post.body,
            post.permalink,
            post.score,
            post.upvote_ratio,
            post.comment_count,
            post.link_flair_text,
            post.thumbnail,
            post.media,
            post.media_metadata,
            post.preview,
            post.gallery_data,
            fetched_at
        ],
    )?;

    Ok(())
}

// Returns the number of newly seeded URLs
pub fn seed_subreddits(conn: &Connection, urls: &[String]) -> Result<usize, StoreError> {
    let mut added = 0;

    for url in urls {
        let affected = conn.execute(
            "INSERT OR IGNORE INTO subreddits (url) VALUES (?1)",
            [url],
        )?;

        if affected > 0 {
            added += 1;
        }
    }

    Ok(added)
}

pub fn subreddit_urls(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare("SELECT url FROM subreddits ORDER BY id")?;

    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut urls = Vec::new();
    for url in rows {
        urls.push(url?);
    }

    Ok(urls)
}

// Fetch all posts for JSON export
pub fn fetch_all_posts(conn: &Connection) -> Result<Vec<StoredPost>, StoreError> {
    let mut stmt = conn.prepare(
        "
        SELECT id, parent_list, author, created_at, title, body, permalink,
               score, upvote_ratio, comment_count
        FROM posts
        ORDER BY created_at DESC
        ",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(StoredPost {
            id: row.get(0)?,
            parent_list: row.get(1)?,
            author: row.get(2)?,
            created_at: row.get(3)?,
            title: row.get(4)?,
            body: row.get(5)?,
            permalink: row.get(6)?,
            score: row.get(7)?,
            upvote_ratio: row.get(8)?,
            comment_count: row.get(9)?,
        })
    })?;

    let mut posts = Vec::new();
    for post in rows {
        posts.push(post?);
    }

    Ok(posts)
}
