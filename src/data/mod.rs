use anyhow::Result;
use sqlx::SqlitePool;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub const DEFAULT_INTERVAL_HOURS: i64 = 12;

pub const DEFAULT_FEEDS: &[&str] = &[
    "https://www.nature.com/nature.rss",
    "https://www.science.org/action/showFeed?type=etoc&feed=rss&jc=science",
    "https://export.arxiv.org/rss/physics",
    "https://export.arxiv.org/rss/cond-mat",
    "https://export.arxiv.org/rss/quant-ph",
    "https://export.arxiv.org/rss/math",
    "https://export.arxiv.org/rss/cs",
];

const INTERVAL_KEY: &str = "interval_hours";

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn add_keyword(&self, guild_id: u64, word: &str) -> Result<bool> {
        let guild_id_i64 = guild_id as i64;

        let result = sqlx::query("INSERT OR IGNORE INTO keywords (guild_id, word) VALUES (?, ?)")
            .bind(guild_id_i64)
            .bind(word)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_keyword(&self, guild_id: u64, word: &str) -> Result<bool> {
        let guild_id_i64 = guild_id as i64;

        let result = sqlx::query("DELETE FROM keywords WHERE guild_id = ? AND word = ?")
            .bind(guild_id_i64)
            .bind(word)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn keywords(&self, guild_id: u64) -> Result<Vec<String>> {
        let guild_id_i64 = guild_id as i64;

        let words = sqlx::query_scalar("SELECT word FROM keywords WHERE guild_id = ? ORDER BY word")
            .bind(guild_id_i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(words)
    }

    pub async fn add_feed(&self, guild_id: u64, url: &str) -> Result<bool> {
        let guild_id_i64 = guild_id as i64;

        let result = sqlx::query("INSERT OR IGNORE INTO feeds (guild_id, url) VALUES (?, ?)")
            .bind(guild_id_i64)
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_feed(&self, guild_id: u64, url: &str) -> Result<bool> {
        let guild_id_i64 = guild_id as i64;

        let result = sqlx::query("DELETE FROM feeds WHERE guild_id = ? AND url = ?")
            .bind(guild_id_i64)
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Scan order is defined by this ordering, so it must stay deterministic.
    pub async fn feeds(&self, guild_id: u64) -> Result<Vec<String>> {
        let guild_id_i64 = guild_id as i64;

        let urls = sqlx::query_scalar("SELECT url FROM feeds WHERE guild_id = ? ORDER BY url")
            .bind(guild_id_i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(urls)
    }

    pub async fn ensure_default_feeds(&self, guild_id: u64) -> Result<()> {
        let guild_id_i64 = guild_id as i64;

        let mut tx = self.pool.begin().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds WHERE guild_id = ?")
            .bind(guild_id_i64)
            .fetch_one(&mut *tx)
            .await?;

        if count == 0 {
            for url in DEFAULT_FEEDS {
                sqlx::query("INSERT OR IGNORE INTO feeds (guild_id, url) VALUES (?, ?)")
                    .bind(guild_id_i64)
                    .bind(*url)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    // Clears only the feed list; seen links survive so old entries are not reposted.
    pub async fn reset_feeds(&self, guild_id: u64) -> Result<()> {
        let guild_id_i64 = guild_id as i64;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM feeds WHERE guild_id = ?")
            .bind(guild_id_i64)
            .execute(&mut *tx)
            .await?;

        for url in DEFAULT_FEEDS {
            sqlx::query("INSERT OR IGNORE INTO feeds (guild_id, url) VALUES (?, ?)")
                .bind(guild_id_i64)
                .bind(*url)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn is_seen(&self, guild_id: u64, link: &str) -> Result<bool> {
        let guild_id_i64 = guild_id as i64;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM seen_links WHERE guild_id = ? AND link = ?")
                .bind(guild_id_i64)
                .bind(link)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    pub async fn mark_seen(&self, guild_id: u64, link: &str) -> Result<()> {
        let guild_id_i64 = guild_id as i64;

        sqlx::query("INSERT OR IGNORE INTO seen_links (guild_id, link) VALUES (?, ?)")
            .bind(guild_id_i64)
            .bind(link)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn interval_hours(&self, guild_id: u64) -> Result<i64> {
        let guild_id_i64 = guild_id as i64;

        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE guild_id = ? AND key = ?")
                .bind(guild_id_i64)
                .bind(INTERVAL_KEY)
                .fetch_optional(&self.pool)
                .await?;

        // A stored value that is not a positive number is treated as unset.
        Ok(value
            .and_then(|v| v.parse().ok())
            .filter(|hours| *hours > 0)
            .unwrap_or(DEFAULT_INTERVAL_HOURS))
    }

    pub async fn set_interval_hours(&self, guild_id: u64, hours: i64) -> Result<()> {
        let guild_id_i64 = guild_id as i64;

        sqlx::query("INSERT OR REPLACE INTO settings (guild_id, key, value) VALUES (?, ?, ?)")
            .bind(guild_id_i64)
            .bind(INTERVAL_KEY)
            .bind(hours.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn feed_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    const GUILD_A: u64 = 100;
    const GUILD_B: u64 = 200;

    async fn memory_db() -> Database {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MIGRATOR.run(&pool).await.unwrap();
        Database::new(pool)
    }

    #[tokio::test]
    async fn adding_a_keyword_twice_keeps_one_copy() {
        let db = memory_db().await;

        assert!(db.add_keyword(GUILD_A, "quantum").await.unwrap());
        assert!(!db.add_keyword(GUILD_A, "quantum").await.unwrap());

        assert_eq!(db.keywords(GUILD_A).await.unwrap(), vec!["quantum"]);
    }

    #[tokio::test]
    async fn removing_a_keyword_reports_whether_it_existed() {
        let db = memory_db().await;

        db.add_keyword(GUILD_A, "graph").await.unwrap();

        assert!(db.remove_keyword(GUILD_A, "graph").await.unwrap());
        assert!(!db.remove_keyword(GUILD_A, "graph").await.unwrap());
        assert!(db.keywords(GUILD_A).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keywords_are_scoped_per_guild() {
        let db = memory_db().await;

        db.add_keyword(GUILD_A, "quantum").await.unwrap();
        db.add_keyword(GUILD_B, "graph").await.unwrap();

        assert_eq!(db.keywords(GUILD_A).await.unwrap(), vec!["quantum"]);
        assert_eq!(db.keywords(GUILD_B).await.unwrap(), vec!["graph"]);
        assert!(!db.remove_keyword(GUILD_B, "quantum").await.unwrap());
    }

    #[tokio::test]
    async fn adding_a_feed_twice_keeps_one_copy() {
        let db = memory_db().await;

        assert!(db.add_feed(GUILD_A, "https://example.com/rss").await.unwrap());
        assert!(!db.add_feed(GUILD_A, "https://example.com/rss").await.unwrap());

        assert_eq!(
            db.feeds(GUILD_A).await.unwrap(),
            vec!["https://example.com/rss"]
        );
    }

    #[tokio::test]
    async fn feeds_are_listed_in_url_order() {
        let db = memory_db().await;

        db.add_feed(GUILD_A, "https://b.example/rss").await.unwrap();
        db.add_feed(GUILD_A, "https://a.example/rss").await.unwrap();

        assert_eq!(
            db.feeds(GUILD_A).await.unwrap(),
            vec!["https://a.example/rss", "https://b.example/rss"]
        );
    }

    #[tokio::test]
    async fn ensure_default_feeds_seeds_an_empty_guild_once() {
        let db = memory_db().await;

        db.ensure_default_feeds(GUILD_A).await.unwrap();
        db.ensure_default_feeds(GUILD_A).await.unwrap();

        let mut expected: Vec<String> = DEFAULT_FEEDS.iter().map(|u| u.to_string()).collect();
        expected.sort();
        assert_eq!(db.feeds(GUILD_A).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn ensure_default_feeds_leaves_configured_guilds_alone() {
        let db = memory_db().await;

        db.add_feed(GUILD_A, "https://example.com/rss").await.unwrap();
        db.ensure_default_feeds(GUILD_A).await.unwrap();

        assert_eq!(
            db.feeds(GUILD_A).await.unwrap(),
            vec!["https://example.com/rss"]
        );
    }

    #[tokio::test]
    async fn reset_feeds_restores_exactly_the_default_list() {
        let db = memory_db().await;

        db.add_feed(GUILD_A, "https://example.com/rss").await.unwrap();
        db.mark_seen(GUILD_A, "https://example.com/post/1").await.unwrap();

        db.reset_feeds(GUILD_A).await.unwrap();

        let mut expected: Vec<String> = DEFAULT_FEEDS.iter().map(|u| u.to_string()).collect();
        expected.sort();
        assert_eq!(db.feeds(GUILD_A).await.unwrap(), expected);
        // History is not part of the reset.
        assert!(db.is_seen(GUILD_A, "https://example.com/post/1").await.unwrap());
    }

    #[tokio::test]
    async fn seen_links_are_idempotent_and_scoped_per_guild() {
        let db = memory_db().await;

        db.mark_seen(GUILD_A, "https://example.com/post/1").await.unwrap();
        db.mark_seen(GUILD_A, "https://example.com/post/1").await.unwrap();

        assert!(db.is_seen(GUILD_A, "https://example.com/post/1").await.unwrap());
        assert!(!db.is_seen(GUILD_B, "https://example.com/post/1").await.unwrap());
    }

    #[tokio::test]
    async fn interval_defaults_until_set_and_overwrites() {
        let db = memory_db().await;

        assert_eq!(
            db.interval_hours(GUILD_A).await.unwrap(),
            DEFAULT_INTERVAL_HOURS
        );

        db.set_interval_hours(GUILD_A, 6).await.unwrap();
        assert_eq!(db.interval_hours(GUILD_A).await.unwrap(), 6);

        db.set_interval_hours(GUILD_A, 48).await.unwrap();
        assert_eq!(db.interval_hours(GUILD_A).await.unwrap(), 48);

        // Other guilds keep the default.
        assert_eq!(
            db.interval_hours(GUILD_B).await.unwrap(),
            DEFAULT_INTERVAL_HOURS
        );
    }

    #[tokio::test]
    async fn interval_falls_back_on_non_positive_stored_values() {
        let db = memory_db().await;

        db.set_interval_hours(GUILD_A, -5).await.unwrap();
        assert_eq!(
            db.interval_hours(GUILD_A).await.unwrap(),
            DEFAULT_INTERVAL_HOURS
        );

        db.set_interval_hours(GUILD_A, 0).await.unwrap();
        assert_eq!(
            db.interval_hours(GUILD_A).await.unwrap(),
            DEFAULT_INTERVAL_HOURS
        );
    }

    #[tokio::test]
    async fn feed_count_spans_all_guilds() {
        let db = memory_db().await;

        db.add_feed(GUILD_A, "https://a.example/rss").await.unwrap();
        db.add_feed(GUILD_B, "https://b.example/rss").await.unwrap();

        assert_eq!(db.feed_count().await.unwrap(), 2);
    }
}
