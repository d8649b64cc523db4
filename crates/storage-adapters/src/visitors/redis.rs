use async_trait::async_trait;
use chrono::NaiveDate;
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Pool, Runtime};
use domains::{DomainError, Result, VisitorCounterStore, VisitorId, VisitorStats};
use tracing::{instrument, warn};

const ALL_VISITORS_KEY: &str = "visitors:all";
/// Daily sets outlive their day so "today" survives timezone skew.
const DAY_KEY_TTL_SECS: i64 = 172_800;

/// Redis-backed counter: one set of every visitor id plus one set per day.
pub struct RedisVisitorCounter {
    pool: Pool,
}

impl RedisVisitorCounter {
    pub fn new(redis_url: &str) -> Result<Self> {
        let pool = Config::from_url(redis_url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| DomainError::Transport(format!("redis pool: {e}")))?;
        Ok(Self { pool })
    }

    fn day_key(day: NaiveDate) -> String {
        format!("visitors:day:{}", day.format("%Y-%m-%d"))
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection> {
        self.pool.get().await.map_err(|e| {
            warn!(error = %e, "redis unavailable");
            DomainError::Transport(format!("redis: {e}"))
        })
    }
}

fn redis_error(e: redis::RedisError) -> DomainError {
    DomainError::Transport(format!("redis: {e}"))
}

#[async_trait]
impl VisitorCounterStore for RedisVisitorCounter {
    #[instrument(skip(self, visitor))]
    async fn record_visit(&self, visitor: &VisitorId, day: NaiveDate) -> Result<VisitorStats> {
        let mut conn = self.connection().await?;
        let day_key = Self::day_key(day);

        let (total, today): (u64, u64) = redis::pipe()
            .atomic()
            .sadd(ALL_VISITORS_KEY, visitor.as_str())
            .ignore()
            .sadd(&day_key, visitor.as_str())
            .ignore()
            .expire(&day_key, DAY_KEY_TTL_SECS)
            .ignore()
            .scard(ALL_VISITORS_KEY)
            .scard(&day_key)
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;

        Ok(VisitorStats { total, today })
    }

    async fn stats(&self, day: NaiveDate) -> Result<VisitorStats> {
        let mut conn = self.connection().await?;
        let total: u64 = conn.scard(ALL_VISITORS_KEY).await.map_err(redis_error)?;
        let today: u64 = conn.scard(Self::day_key(day)).await.map_err(redis_error)?;
        Ok(VisitorStats { total, today })
    }
}
