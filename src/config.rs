use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use tracing::warn;

pub const DEFAULT_MAX_PAGES: u32 = 1;

fn default_db_path() -> String {
    "crawler.db".to_string()
}

fn default_export_path() -> String {
    "posts.json".to_string()
}

fn default_listing_suffix() -> String {
    "new/".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_export_path")]
    pub export_path: String,
    // Kept as raw JSON so a bad value degrades instead of failing the load
    #[serde(default)]
    max_pages: Value,
    #[serde(default)]
    pub subreddits: Vec<SubredditConfig>,
    pub discover: Option<DiscoverConfig>,
}

#[derive(Debug, Deserialize)]
pub struct SubredditConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverConfig {
    pub directory_url: String,
    #[serde(default = "default_listing_suffix")]
    pub listing_suffix: String,
}

impl Config {
    // max_pages only bounds crawl depth, so an invalid value is corrected
    // to the default rather than treated as fatal.
    pub fn page_budget(&self) -> u32 {
        if self.max_pages.is_null() {
            return DEFAULT_MAX_PAGES;
        }

        match self.max_pages.as_i64() {
            Some(n) if n > 0 => n as u32,
            _ => {
                warn!(
                    max_pages = %self.max_pages,
                    default = DEFAULT_MAX_PAGES,
                    "max_pages must be a positive integer, using default"
                );
                DEFAULT_MAX_PAGES
            }
        }
    }
}

pub fn load(path: &str) -> Result<Config> {
    let text = fs::read_to_string(path)?;
    parse(&text)
}

fn parse(text: &str) -> Result<Config> {
    let config: Config = serde_json::from_str(text)?;
    Ok(config)
}
