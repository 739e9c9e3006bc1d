//! Redis integration service implementation
//!
//! Short-lived values such as password reset codes are kept in Redis with a TTL.

use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RedisConfig;
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct RedisService {
    client: Client,
    prefix: String,
    default_ttl: u64,
}

impl RedisService {
    /// Create a new RedisService; the connection is opened on first use
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;

        Ok(Self {
            client,
            prefix: config.prefix.clone(),
            default_ttl: config.ttl_seconds,
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Set a value in Redis with TTL
    pub async fn set<T>(&self, key: &str, value: &T, ttl_seconds: Option<u64>) -> Result<()>
    where
        T: Serialize,
    {
        let mut conn = self.connection().await?;
        let serialized = serde_json::to_string(value)?;
        let full_key = self.full_key(key);
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);

        let _: () = conn.set_ex(&full_key, serialized, ttl).await?;

        debug!(key = %full_key, ttl = ttl, "Value set in Redis");
        Ok(())
    }

    /// Get a value from Redis
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut conn = self.connection().await?;
        let full_key = self.full_key(key);

        let result: Option<String> = conn.get(&full_key).await?;
        match result {
            Some(data) => Ok(Some(serde_json::from_str::<T>(&data)?)),
            None => {
                debug!(key = %full_key, "Key not found in Redis");
                Ok(None)
            }
        }
    }

    /// Delete a key from Redis
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let deleted: i32 = conn.del(self.full_key(key)).await?;
        Ok(deleted > 0)
    }

    /// Ping the server
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_prefixed() {
        let service = RedisService::new(&RedisConfig {
            url: "redis://127.0.0.1:6379".to_string(),
            prefix: "waddle:".to_string(),
            ttl_seconds: 60,
        })
        .unwrap();
        assert_eq!(service.full_key("reset:user:a@b.com"), "waddle:reset:user:a@b.com");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = RedisService::new(&RedisConfig {
            url: "not-a-redis-url".to_string(),
            prefix: String::new(),
            ttl_seconds: 60,
        });
        assert!(result.is_err());
    }
}
