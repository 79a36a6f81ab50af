use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::DaoError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplenishmentPaymentEntity {
    pub id: Uuid,
    pub replenishment_id: Uuid,
    pub amount_cents: u64,
    pub executed_at: PrimitiveDateTime,
    pub succeeded: bool,
    pub version: Uuid,
}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait ReplenishmentPaymentDao {
    type Transaction: crate::Transaction;

    async fn find_by_replenishment_id(
        &self,
        replenishment_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Arc<[ReplenishmentPaymentEntity]>, DaoError>;
    async fn count_by_replenishment_id(
        &self,
        replenishment_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<u32, DaoError>;
    async fn create(
        &self,
        entity: &ReplenishmentPaymentEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError>;
}
