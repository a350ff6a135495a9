use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serenity::{
    all::{ActivityData, Guild, OnlineStatus, Ready},
    async_trait,
    model::channel::Message,
    prelude::*,
};
use sqlx::SqlitePool;
use tracing::{error, info};

mod cmd;
mod data;
mod scan;
mod scheduler;
mod util;

use data::Database;
use scan::control::ScanControl;
use util::fetcher::HttpFetcher;

#[derive(Debug, Deserialize)]
struct Config {
    bot: BotConfig,
    database: DatabaseConfig,
}

#[derive(Debug, Deserialize)]
struct BotConfig {
    token: String,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    url: String,
}

impl Config {
    fn load() -> Result<Self> {
        let config_str = std::fs::read_to_string("config.toml")?;
        Ok(toml::from_str(&config_str)?)
    }
}

struct Handler {
    database: Arc<Database>,
    fetcher: Arc<HttpFetcher>,
    control: Arc<ScanControl>,
}

impl Handler {
    async fn update(&self, ctx: &Context) {
        match self.database.feed_count().await {
            Ok(count) => {
                let activity = ActivityData::watching(format!("{} feeds", count));
                ctx.set_presence(Some(activity), OnlineStatus::Online);
                info!("Updated status: Watching {} feeds", count);
            }
            Err(e) => error!("Failed to get feed count for status: {}", e),
        }
    }

    async fn start_loop(&self, ctx: &Context, guild_id: u64) {
        scheduler::tasks::spawn(
            ctx.clone(),
            self.database.clone(),
            self.fetcher.clone(),
            self.control.clone(),
            guild_id,
        )
        .await;
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
        self.update(&ctx).await;

        for guild in &ready.guilds {
            self.start_loop(&ctx, guild.id.get()).await;
        }
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, _is_new: Option<bool>) {
        if let Err(e) = self.database.ensure_default_feeds(guild.id.get()).await {
            error!(
                "Failed to seed default feeds for guild {}: {:#}",
                guild.id, e
            );
        }
        self.start_loop(&ctx, guild.id.get()).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        match cmd::dispatch(&ctx, &msg, &self.database, &self.fetcher, &self.control).await {
            Ok(Some(command)) if command.changes_feeds() => self.update(&ctx).await,
            Ok(_) => {}
            Err(e) => {
                error!("Command error: {}", e);
                let _ = msg
                    .channel_id
                    .say(&ctx.http, "An error occurred while processing the command.")
                    .await;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let pool = SqlitePool::connect(&config.database.url).await?;

    data::MIGRATOR.run(&pool).await?;

    let handler = Handler {
        database: Arc::new(Database::new(pool)),
        fetcher: Arc::new(HttpFetcher::new()?),
        control: Arc::new(ScanControl::new()),
    };

    let mut client = Client::builder(
        &config.bot.token,
        GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS,
    )
    .event_handler(handler)
    .await?;

    client.start().await?;
    Ok(())
}
