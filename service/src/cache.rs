use async_trait::async_trait;
use mockall::automock;

use crate::ServiceError;

/// Key-value store used for denormalized lookup pointers. Never the source
/// of truth.
#[automock]
#[async_trait]
pub trait CacheService {
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), ServiceError>;
    async fn hdel(&self, key: &str, field: &str) -> Result<(), ServiceError>;
    async fn del(&self, key: &str) -> Result<(), ServiceError>;
}
