use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use crate::{
    scan::{FeedEntry, FetchFeed},
    util::parser,
};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 PaperBot")
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FetchFeed for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("HTTP {}", response.status()));
        }

        let bytes = response.bytes().await?;
        if bytes.len() > 5_000_000 {
            return Err(anyhow::anyhow!("Feed too large: {} bytes", bytes.len()));
        }

        parser::entries(&String::from_utf8_lossy(&bytes))
    }
}
