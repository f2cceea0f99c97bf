pub mod memory;
pub mod postgres;
pub mod redis;
pub mod repository;

pub use memory::MemoryRepository;
pub use postgres::{create_pool, PgRepository};
pub use redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use repository::Repository;
