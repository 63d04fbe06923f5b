//! Redis client used as the external image store

use crate::{error::AppError, Result};
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use tracing::info;

#[derive(Clone)]
pub struct RedisService {
    connection: MultiplexedConnection,
}

impl std::fmt::Debug for RedisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisService").finish_non_exhaustive()
    }
}

impl RedisService {
    pub async fn new(url: &str) -> Result<Self> {
        info!("Initializing Redis connection");

        let client = Client::open(url)
            .map_err(|e| AppError::configuration(format!("Failed to create Redis client: {}", e)))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::cache(format!("Failed to connect to Redis: {}", e)))?;

        // Test the connection
        let mut conn = connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::cache(format!("Redis health check failed: {}", e)))?;

        info!("Redis connection initialized successfully");

        Ok(Self { connection })
    }

    /// Raw bytes for `key`, `None` when the key does not exist.
    pub async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let result: Option<Vec<u8>> = conn.get(key).await?;
        Ok(result)
    }

    /// Set raw bytes with expiration
    pub async fn set_bytes_ex(&self, key: &str, value: &[u8], expiration_seconds: u64) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, expiration_seconds).await?;
        Ok(())
    }

    /// Set raw bytes without expiration
    pub async fn set_bytes(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
