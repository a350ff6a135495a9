use std::sync::Arc;

use anyhow::Result;
use serenity::{model::channel::Message, prelude::*};
use tracing::{error, info};

use crate::{
    data::Database,
    scan::{
        self, FetchFeed, MatchMode, Sink,
        control::{CancelFlag, ScanControl},
    },
    util::{fetcher::HttpFetcher, sink::ChannelSink},
};

pub async fn start(
    ctx: &Context,
    msg: &Message,
    database: &Arc<Database>,
    fetcher: &Arc<HttpFetcher>,
    control: &Arc<ScanControl>,
    guild_id: u64,
    mode: MatchMode,
) -> Result<()> {
    msg.channel_id.say(&ctx.http, "🔍 Scanning now...").await?;

    let database = database.clone();
    let fetcher = fetcher.clone();
    let cancel = control.flag(guild_id).await;
    let sink = ChannelSink::new(ctx.http.clone(), msg.channel_id);

    // Detached so a stop command can be handled while the scan runs.
    tokio::spawn(async move {
        run_and_report(&database, fetcher.as_ref(), &sink, &cancel, guild_id, mode).await;
    });

    Ok(())
}

async fn run_and_report(
    database: &Database,
    fetcher: &dyn FetchFeed,
    sink: &dyn Sink,
    cancel: &CancelFlag,
    guild_id: u64,
    mode: MatchMode,
) {
    match scan::run(database, fetcher, sink, cancel, guild_id, mode).await {
        Ok(report) => info!(
            "Manual scan for guild {} emitted {} entries ({:?})",
            guild_id, report.emitted, report.status
        ),
        Err(e) => {
            error!("Manual scan for guild {} failed: {:#}", guild_id, e);
            // Without this the invoking channel only ever sees the ack.
            let _ = sink.send("⚠️ Scan failed.").await;
        }
    }
}

pub async fn stop(
    ctx: &Context,
    msg: &Message,
    control: &Arc<ScanControl>,
    guild_id: u64,
) -> Result<()> {
    control.request_stop(guild_id).await;
    msg.channel_id.say(&ctx.http, "🛑 Stop requested.").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;
    use crate::{data::MIGRATOR, scan::FeedEntry};

    #[derive(Default)]
    struct MemorySink {
        sent: Mutex<Vec<String>>,
    }

    impl MemorySink {
        fn messages(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sink for MemorySink {
        async fn send(&self, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct EmptyFetcher;

    #[async_trait]
    impl FetchFeed for EmptyFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<FeedEntry>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn failed_scan_reports_through_the_sink() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MIGRATOR.run(&pool).await.unwrap();
        let database = Database::new(pool.clone());
        // Closing the pool makes every store call fail.
        pool.close().await;

        let sink = MemorySink::default();
        run_and_report(
            &database,
            &EmptyFetcher,
            &sink,
            &CancelFlag::default(),
            1,
            MatchMode::Any,
        )
        .await;

        assert_eq!(sink.messages(), vec!["⚠️ Scan failed."]);
    }
}
