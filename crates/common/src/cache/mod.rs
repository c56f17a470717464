//! Redis cache for finished graph exports
//!
//! A build is fully determined by its normalized request and the loaded
//! snapshot, so rendered exports are stored verbatim under a key derived
//! from the request hash and expire after the configured TTL.

use crate::config::RedisConfig;
use crate::errors::{AppError, Result};
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use tracing::debug;

/// Redis-backed store of rendered graph exports
#[derive(Clone)]
pub struct Cache {
    connection: MultiplexedConnection,
    prefix: String,
    ttl_secs: u64,
}

impl Cache {
    /// Connect to Redis
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(|e| AppError::Cache {
            message: format!("invalid Redis URL: {}", e),
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Cache {
                message: format!("Redis connection failed: {}", e),
            })?;

        Ok(Self {
            connection,
            prefix: config.key_prefix,
            ttl_secs: config.default_ttl_secs,
        })
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    /// Rendered export stored under `key`, if any
    pub async fn get_export(&self, key: &str) -> Result<Option<String>> {
        let key = self.namespaced(key);
        let mut conn = self.connection.clone();

        let body: Option<String> = conn.get(&key).await?;
        debug!(key = %key, hit = body.is_some(), "Graph cache lookup");
        Ok(body)
    }

    /// Store a rendered export for the configured TTL
    pub async fn put_export(&self, key: &str, body: &str) -> Result<()> {
        let key = self.namespaced(key);
        let mut conn = self.connection.clone();

        conn.set_ex::<_, _, ()>(&key, body, self.ttl_secs).await?;
        debug!(key = %key, bytes = body.len(), ttl_secs = self.ttl_secs, "Graph cached");
        Ok(())
    }

    /// Round-trip a PING
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

/// Cache key layout
pub mod keys {
    /// `graph:{format}:{request_hash}`
    pub fn graph(request_hash: &str, format: &str) -> String {
        format!("graph:{}:{}", format, request_hash)
    }
}
