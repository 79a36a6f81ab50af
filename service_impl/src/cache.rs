use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use service::cache::CacheService;
use service::ServiceError;

/// Redis-backed cache. The connection manager reconnects on its own, every
/// operation works on a cheap clone of it.
pub struct RedisCacheService {
    connection: ConnectionManager,
}
impl RedisCacheService {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

fn map_redis_error(err: redis::RedisError) -> ServiceError {
    ServiceError::CacheStoreError(Box::new(err))
}

#[async_trait]
impl CacheService for RedisCacheService {
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), ServiceError> {
        let mut connection = self.connection.clone();
        connection
            .hset::<_, _, _, ()>(key, field, value)
            .await
            .map_err(map_redis_error)
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<(), ServiceError> {
        let mut connection = self.connection.clone();
        connection
            .hdel::<_, _, ()>(key, field)
            .await
            .map_err(map_redis_error)
    }

    async fn del(&self, key: &str) -> Result<(), ServiceError> {
        let mut connection = self.connection.clone();
        connection
            .del::<_, ()>(key)
            .await
            .map_err(map_redis_error)
    }
}
