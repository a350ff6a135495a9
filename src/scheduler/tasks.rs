use std::{collections::HashSet, sync::Arc};

use serenity::{
    all::{ChannelId, ChannelType, GuildId},
    prelude::*,
};
use tokio::{
    sync::Mutex,
    time::{Duration, sleep},
};
use tracing::{error, info, warn};

use crate::{
    data::{DEFAULT_INTERVAL_HOURS, Database},
    scan::{self, MatchMode, control::ScanControl},
    util::{fetcher::HttpFetcher, sink::ChannelSink},
};

static RUNNING: std::sync::LazyLock<Mutex<HashSet<u64>>> =
    std::sync::LazyLock::new(|| Mutex::new(HashSet::new()));

// One loop per guild. Events can report the same guild more than once, so
// the registry keeps a second call from stacking a duplicate loop.
pub async fn spawn(
    ctx: Context,
    database: Arc<Database>,
    fetcher: Arc<HttpFetcher>,
    control: Arc<ScanControl>,
    guild_id: u64,
) {
    if !RUNNING.lock().await.insert(guild_id) {
        return;
    }

    info!("Starting feed loop for guild {}", guild_id);
    tokio::spawn(async move {
        loop {
            // Re-read every tick so a new interval takes effect after the
            // sleep in progress, without restarting the loop.
            let hours = match database.interval_hours(guild_id).await {
                Ok(hours) => hours,
                Err(e) => {
                    error!("Failed to read interval for guild {}: {:#}", guild_id, e);
                    DEFAULT_INTERVAL_HOURS
                }
            };
            sleep(Duration::from_secs(wait_seconds(hours))).await;

            if !ctx.cache.guilds().contains(&GuildId::new(guild_id)) {
                info!("Guild {} is gone, stopping its feed loop", guild_id);
                RUNNING.lock().await.remove(&guild_id);
                break;
            }

            let Some(channel) = destination(&ctx, guild_id).await else {
                warn!("No channel to post into for guild {}", guild_id);
                continue;
            };

            let sink = ChannelSink::new(ctx.http.clone(), channel);
            let cancel = control.flag(guild_id).await;
            let result = scan::run(
                &database,
                fetcher.as_ref(),
                &sink,
                &cancel,
                guild_id,
                MatchMode::Any,
            )
            .await;

            match result {
                Ok(report) => info!(
                    "Scheduled scan for guild {} emitted {} entries ({:?})",
                    guild_id, report.emitted, report.status
                ),
                Err(e) => error!("Scheduled scan for guild {} failed: {:#}", guild_id, e),
            }
        }
    });
}

// Saturates instead of overflowing if the store ever hands back an
// absurd interval.
fn wait_seconds(hours: i64) -> u64 {
    (hours as u64).saturating_mul(3600)
}

async fn destination(ctx: &Context, guild_id: u64) -> Option<ChannelId> {
    let channels = match GuildId::new(guild_id).channels(&ctx.http).await {
        Ok(channels) => channels,
        Err(e) => {
            warn!("Failed to list channels for guild {}: {}", guild_id, e);
            return None;
        }
    };

    let me = ctx.cache.current_user().id;

    let mut candidates: Vec<_> = channels
        .into_values()
        .filter(|channel| channel.kind == ChannelType::Text)
        .collect();
    candidates.sort_by_key(|channel| (channel.position, channel.id));

    for channel in candidates {
        #[allow(deprecated)]
        let perms = channel.permissions_for_user(&ctx.cache, me);
        if let Ok(perms) = perms {
            if perms.view_channel() && perms.send_messages() {
                return Some(channel.id);
            }
        }
    }

    None
}
