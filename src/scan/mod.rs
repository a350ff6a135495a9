use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::data::Database;

pub mod control;

use control::CancelFlag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Completed,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub emitted: usize,
    pub status: ScanStatus,
}

#[async_trait]
pub trait FetchFeed: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>>;
}

#[async_trait]
pub trait Sink: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

pub async fn run(
    database: &Database,
    fetcher: &dyn FetchFeed,
    sink: &dyn Sink,
    cancel: &CancelFlag,
    guild_id: u64,
    mode: MatchMode,
) -> Result<ScanReport> {
    // A stop request always targets the scan that is running when it is
    // issued, so a leftover one must not kill this run before it starts.
    cancel.clear();

    database.ensure_default_feeds(guild_id).await?;

    let keywords: Vec<String> = database
        .keywords(guild_id)
        .await?
        .into_iter()
        .map(|word| word.to_lowercase())
        .collect();
    let feeds = database.feeds(guild_id).await?;

    let mut emitted = 0;
    for url in &feeds {
        if cancel.is_set() {
            return stopped(sink, emitted).await;
        }

        let entries = match fetcher.fetch(url).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to fetch {} for guild {}: {:#}", url, guild_id, e);
                continue;
            }
        };
        debug!("Fetched {} entries from {}", entries.len(), url);

        for entry in entries {
            if cancel.is_set() {
                return stopped(sink, emitted).await;
            }
            if database.is_seen(guild_id, &entry.link).await? {
                continue;
            }
            if !title_matches(&entry.title, &keywords, mode) {
                continue;
            }

            // Record the link only after it went out, so a failed delivery
            // is retried on the next scan instead of being lost.
            sink.send(&format!("📄 **{}**\n{}", entry.title, entry.link))
                .await?;
            database.mark_seen(guild_id, &entry.link).await?;
            emitted += 1;
        }
    }

    if emitted > 0 {
        sink.send("✅ Scan complete.").await?;
    } else {
        sink.send("✅ No new matching papers found.").await?;
    }

    Ok(ScanReport {
        emitted,
        status: ScanStatus::Completed,
    })
}

async fn stopped(sink: &dyn Sink, emitted: usize) -> Result<ScanReport> {
    sink.send("🛑 Scan stopped.").await?;
    Ok(ScanReport {
        emitted,
        status: ScanStatus::Stopped,
    })
}

fn title_matches(title: &str, keywords: &[String], mode: MatchMode) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let title = title.to_lowercase();
    match mode {
        MatchMode::Any => keywords.iter().any(|word| title.contains(word.as_str())),
        MatchMode::All => keywords.iter().all(|word| title.contains(word.as_str())),
    }
}
