use anyhow::Result;
use feed_rs::parser;

use crate::scan::FeedEntry;

pub fn entries(content: &str) -> Result<Vec<FeedEntry>> {
    let feed = parser::parse(content.as_bytes())?;

    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.links.first()?.href.clone();
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            Some(FeedEntry { title, link })
        })
        .collect())
}
