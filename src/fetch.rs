use anyhow::Result;
use reqwest::{Client, StatusCode};
use thiserror::Error;

const USER_AGENT: &str = "reddit_meta_crawler/0.1 (listing metadata archiver)";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status error: {status} {url}")]
    HttpStatus { status: StatusCode, url: String },
}

// Transport seam. The crawl loop only ever needs a body for a URL.
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status(),
                url: url.to_string(),
            }
            .into());
        }

        Ok(response.text().await?)
    }
}
