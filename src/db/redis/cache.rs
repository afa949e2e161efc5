use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Multi search results for a query
    Search(String),
    /// Full title document: (media type, TMDb id)
    TitleDetails(String, i64),
    /// Lighter details document used by search previews
    SearchDetails(String, i64),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Search(query) => write!(f, "tmdb:search:{}", query.trim().to_lowercase()),
            CacheKey::TitleDetails(media_type, id) => {
                write!(f, "tmdb:title:{}:{}", media_type, id)
            }
            CacheKey::SearchDetails(media_type, id) => {
                write!(f, "tmdb:details:{}:{}", media_type, id)
            }
        }
    }
}

/// Creates a Redis client for caching
///
/// Establishes a connection to Redis for fast data caching.
/// Uses connection pooling via the connection-manager feature.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// A pending write handed to the writer task
struct CacheWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed cache for TMDb responses
///
/// Reads go straight to Redis. Writes are queued on a channel and applied by a
/// background task so a slow or absent Redis never delays a response.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWrite>,
}

/// Stops the writer task once queued writes are flushed
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates the cache and spawns its writer task
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::run_writer(client, write_rx, shutdown_rx).await;
        });

        (
            Self {
                redis_client,
                write_tx,
            },
            CacheWriterHandle { shutdown_tx },
        )
    }

    async fn run_writer(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Cache writer task started");

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => Self::apply(&client, write).await,
                _ = shutdown_rx.recv() => {
                    // Refuse new writes, then drain what is already queued
                    write_rx.close();
                    let mut flushed = 0usize;
                    while let Some(write) = write_rx.recv().await {
                        Self::apply(&client, write).await;
                        flushed += 1;
                    }
                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn apply(client: &Client, write: CacheWrite) {
        let key = write.key.clone();
        let result: AppResult<()> = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(write.key, write.value, write.ttl).await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, key = %key, "Cache write failed");
        }
    }

    /// Reads and deserializes a cached value; `Ok(None)` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })
            })
            .transpose()
    }

    /// Like [`Cache::get_from_cache`] but treats every failure as a miss
    pub async fn get_or_miss<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.get_from_cache(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Queues a write; returns immediately
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let write = CacheWrite {
            key: key.to_string(),
            value,
            ttl,
        };

        if self.write_tx.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer stopped, dropping write");
        }
    }
}
