use std::sync::Arc;

use anyhow::Result;
use serenity::{model::channel::Message, prelude::*};

use crate::{cmd::code_list, data::Database};

pub async fn add(
    ctx: &Context,
    msg: &Message,
    database: &Arc<Database>,
    guild_id: u64,
    words: &[String],
) -> Result<()> {
    for word in words {
        database.add_keyword(guild_id, word).await?;
    }

    msg.channel_id
        .say(
            &ctx.http,
            format!("✅ Added keywords: {}", code_list(words, ", ")),
        )
        .await?;
    Ok(())
}

pub async fn remove(
    ctx: &Context,
    msg: &Message,
    database: &Arc<Database>,
    guild_id: u64,
    words: &[String],
) -> Result<()> {
    let mut removed = Vec::new();
    for word in words {
        if database.remove_keyword(guild_id, word).await? {
            removed.push(word.as_str());
        }
    }

    let reply = if removed.is_empty() {
        "No matching keywords found.".to_string()
    } else {
        format!("🗑️ Removed keywords: {}", code_list(&removed, ", "))
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
    let words = database.keywords(guild_id).await?;

    let reply = if words.is_empty() {
        "No keywords set.".to_string()
    } else {
        format!("🔑 Keywords:\n{}", code_list(&words, ", "))
    };
    msg.channel_id.say(&ctx.http, reply).await?;
    Ok(())
}
