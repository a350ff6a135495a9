use std::sync::Arc;

use anyhow::Result;
use serenity::{model::channel::Message, prelude::*};

use crate::{
    data::Database,
    scan::{MatchMode, control::ScanControl},
    util::fetcher::HttpFetcher,
};

pub mod feeds;
pub mod interval;
pub mod keywords;
pub mod scan;

// One year. Also keeps the scheduler's seconds arithmetic in range.
const MAX_INTERVAL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddKeywords(Vec<String>),
    RemoveKeywords(Vec<String>),
    ListKeywords,
    AddFeed(String),
    RemoveFeed(String),
    ListFeeds,
    SetInterval(i64),
    Scan(MatchMode),
    StopScan,
    ResetFeeds,
}

impl Command {
    pub fn changes_feeds(&self) -> bool {
        matches!(
            self,
            Command::AddFeed(_) | Command::RemoveFeed(_) | Command::ResetFeeds
        )
    }
}

pub fn parse(content: &str) -> Option<Result<Command, String>> {
    let trimmed = content.trim();
    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (trimmed, ""),
    };

    let parsed = match name {
        "!addkeyword" => keywords_arg(rest).map(Command::AddKeywords),
        "!removekeyword" => keywords_arg(rest).map(Command::RemoveKeywords),
        "!listkeywords" => Ok(Command::ListKeywords),
        "!addfeed" => feed_arg(rest).map(Command::AddFeed),
        "!removefeed" => feed_arg(rest).map(Command::RemoveFeed),
        "!listfeeds" => Ok(Command::ListFeeds),
        "!setinterval" => interval_arg(rest).map(Command::SetInterval),
        "!scan" => mode_arg(rest).map(Command::Scan),
        "!stopscan" => Ok(Command::StopScan),
        "!resetfeeds" => Ok(Command::ResetFeeds),
        _ => return None,
    };

    Some(parsed)
}

fn keywords_arg(rest: &str) -> Result<Vec<String>, String> {
    let words: Vec<String> = rest
        .split(',')
        .map(|word| word.trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect();

    if words.is_empty() {
        return Err("Provide a keyword.".to_string());
    }
    Ok(words)
}

fn feed_arg(rest: &str) -> Result<String, String> {
    if rest.is_empty() {
        return Err("Provide a feed URL.".to_string());
    }
    Ok(rest.to_string())
}

fn interval_arg(rest: &str) -> Result<i64, String> {
    let hours: i64 = rest.parse().map_err(|_| "Invalid number.".to_string())?;
    if hours <= 0 {
        return Err("Interval must be > 0.".to_string());
    }
    if hours > MAX_INTERVAL_HOURS {
        return Err(format!(
            "Interval must be {} hours or less.",
            MAX_INTERVAL_HOURS
        ));
    }
    Ok(hours)
}

fn mode_arg(rest: &str) -> Result<MatchMode, String> {
    match rest {
        "" | "any" => Ok(MatchMode::Any),
        "all" => Ok(MatchMode::All),
        other => Err(format!("Unknown mode `{}`. Use `any` or `all`.", other)),
    }
}

// Returns the handled command so the caller can react to state changes.
pub async fn dispatch(
    ctx: &Context,
    msg: &Message,
    database: &Arc<Database>,
    fetcher: &Arc<HttpFetcher>,
    control: &Arc<ScanControl>,
) -> Result<Option<Command>> {
    let Some(guild_id) = msg.guild_id else {
        return Ok(None);
    };
    let guild_id = guild_id.get();

    let command = match parse(&msg.content) {
        Some(Ok(command)) => command,
        Some(Err(reason)) => {
            msg.channel_id
                .say(&ctx.http, format!("⚠️ {}", reason))
                .await?;
            return Ok(None);
        }
        None => return Ok(None),
    };

    match &command {
        Command::AddKeywords(words) => keywords::add(ctx, msg, database, guild_id, words).await?,
        Command::RemoveKeywords(words) => {
            keywords::remove(ctx, msg, database, guild_id, words).await?
        }
        Command::ListKeywords => keywords::list(ctx, msg, database, guild_id).await?,
        Command::AddFeed(url) => feeds::add(ctx, msg, database, guild_id, url).await?,
        Command::RemoveFeed(url) => feeds::remove(ctx, msg, database, guild_id, url).await?,
        Command::ListFeeds => feeds::list(ctx, msg, database, guild_id).await?,
        Command::ResetFeeds => feeds::reset(ctx, msg, database, guild_id).await?,
        Command::SetInterval(hours) => interval::set(ctx, msg, database, guild_id, *hours).await?,
        Command::Scan(mode) => {
            scan::start(ctx, msg, database, fetcher, control, guild_id, *mode).await?
        }
        Command::StopScan => scan::stop(ctx, msg, control, guild_id).await?,
    }

    Ok(Some(command))
}

pub(crate) fn code_list<S: AsRef<str>>(items: &[S], separator: &str) -> String {
    items
        .iter()
        .map(|item| format!("`{}`", item.as_ref()))
        .collect::<Vec<_>>()
        .join(separator)
}
