use std::sync::Arc;

use anyhow::Result;
use serenity::{model::channel::Message, prelude::*};
use url::Url;

use crate::{cmd::code_list, data::Database};

pub async fn add(
    ctx: &Context,
    msg: &Message,
    database: &Arc<Database>,
    guild_id: u64,
    url: &str,
) -> Result<()> {
    if Url::parse(url).is_err() {
        msg.channel_id
            .say(&ctx.http, "⚠️ Invalid URL format.")
            .await?;
        return Ok(());
    }

    let reply = if database.add_feed(guild_id, url).await? {
        format!("🌐 Added feed: `{}`", url)
    } else {
        "⚠️ Feed already added.".to_string()
    };
    msg.channel_id.say(&ctx.http, reply).await?;
    Ok(())
}

pub async fn remove(
    ctx: &Context,
    msg: &Message,
    database: &Arc<Database>,
    guild_id: u64,
    url: &str,
) -> Result<()> {
    let reply = if database.remove_feed(guild_id, url).await? {
        format!("🗑️ Removed feed: `{}`", url)
    } else {
        "⚠️ Feed not found.".to_string()
    };
    msg.channel_id.say(&ctx.http, reply).await?;
    Ok(())
}

pub async fn list(
    ctx: &Context,
    msg: &Message,
    database: &Arc<Database>,
    guild_id: u64,
) -> Result<()> {
    let urls = database.feeds(guild_id).await?;

    let reply = if urls.is_empty() {
        "No feeds set.".to_string()
    } else {
        format!("🌐 Feeds:\n{}", code_list(&urls, "\n"))
    };
    msg.channel_id.say(&ctx.http, reply).await?;
    Ok(())
}

pub async fn reset(
    ctx: &Context,
    msg: &Message,
    database: &Arc<Database>,
    guild_id: u64,
) -> Result<()> {
    database.reset_feeds(guild_id).await?;
    msg.channel_id
        .say(&ctx.http, "♻️ Feeds have been reset to default.")
        .await?;
    Ok(())
}
