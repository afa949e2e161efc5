pub mod postgres;
pub mod redis;
pub mod repository;

pub use postgres::{create_pool, run_migrations, PgRepository};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
pub use redis::CacheWriterHandle;
pub use repository::Repository;

#[cfg(test)]
pub use repository::MockRepository;
