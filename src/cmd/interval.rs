use std::sync::Arc;

use anyhow::Result;
use serenity::{model::channel::Message, prelude::*};

use crate::data::Database;

pub async fn set(
    ctx: &Context,
    msg: &Message,
    database: &Arc<Database>,
    guild_id: u64,
    hours: i64,
) -> Result<()> {
    database.set_interval_hours(guild_id, hours).await?;
    msg.channel_id
        .say(&ctx.http, format!("⏱️ Interval set to {} hours.", hours))
        .await?;
    Ok(())
}
