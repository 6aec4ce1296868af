//! Redis-backed session store

use async_trait::async_trait;
use redis::Client;

use crate::error::{AppError, AppResult};

/// Server-side session state, keyed by the session cookie value
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Count a home page visit and return the number of visits before it
    async fn record_visit(&self, session_id: &str) -> AppResult<i64>;
    async fn ping(&self) -> AppResult<()>;
}

#[derive(Clone)]
pub struct RedisService {
    client: Client,
    ttl_seconds: i64,
}

impl RedisService {
    /// Create a new Redis service
    pub async fn new(url: &str, ttl_seconds: i64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Session(format!("Failed to create Redis client: {}", e)))?;

        let service = Self { client, ttl_seconds };
        service.ping().await?;
        Ok(service)
    }

    fn visits_key(session_id: &str) -> String {
        format!("session:{}:num_visits", session_id)
    }

    /// Get a Redis connection
    pub async fn get_connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Session(format!("Failed to get Redis connection: {}", e)))
    }
}

#[async_trait]
impl SessionStore for RedisService {
    async fn record_visit(&self, session_id: &str) -> AppResult<i64> {
        let mut conn = self.get_connection().await?;
        let key = Self::visits_key(session_id);

        // INCR starts missing keys at 0, so the first visit reports 0
        let (visits,): (i64,) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&key)
            .cmd("EXPIRE")
            .arg(&key)
            .arg(self.ttl_seconds)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Session(format!("Failed to count visit in Redis: {}", e)))?;

        Ok(visits - 1)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Session(format!("Redis connection test failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_keys_are_scoped_per_session() {
        assert_eq!(
            RedisService::visits_key("3f1c"),
            "session:3f1c:num_visits"
        );
        assert_ne!(RedisService::visits_key("a"), RedisService::visits_key("b"));
    }
}
