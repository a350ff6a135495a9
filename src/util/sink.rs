use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serenity::{http::Http, model::id::ChannelId};

use crate::scan::Sink;

pub struct ChannelSink {
    http: Arc<Http>,
    channel: ChannelId,
}

impl ChannelSink {
    pub fn new(http: Arc<Http>, channel: ChannelId) -> Self {
        Self { http, channel }
    }
}

#[async_trait]
impl Sink for ChannelSink {
    async fn send(&self, text: &str) -> Result<()> {
        self.channel.say(&self.http, text).await?;
        Ok(())
    }
}
