use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    replenishment_payment::{ReplenishmentPaymentDao, ReplenishmentPaymentEntity},
    DaoError,
};
use sqlx::{query, query_as, query_scalar};
use uuid::Uuid;

use crate::{format_date_time, parse_date_time, ResultDbErrorExt, TransactionImpl};

pub struct ReplenishmentPaymentDaoImpl {
    pub _pool: Arc<sqlx::SqlitePool>,
}
impl ReplenishmentPaymentDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { _pool: pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReplenishmentPaymentDb {
    id: Vec<u8>,
    replenishment_id: Vec<u8>,
    amount_cents: i64,
    executed_at: String,
    succeeded: bool,
    update_version: Vec<u8>,
}
impl TryFrom<&ReplenishmentPaymentDb> for ReplenishmentPaymentEntity {
    type Error = DaoError;
    fn try_from(payment: &ReplenishmentPaymentDb) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::from_slice(payment.id.as_ref())?,
            replenishment_id: Uuid::from_slice(payment.replenishment_id.as_ref())?,
            amount_cents: payment.amount_cents as u64,
            executed_at: parse_date_time(&payment.executed_at)?,
            succeeded: payment.succeeded,
            version: Uuid::from_slice(payment.update_version.as_ref())?,
        })
    }
}

#[async_trait]
impl ReplenishmentPaymentDao for ReplenishmentPaymentDaoImpl {
    type Transaction = TransactionImpl;

    async fn find_by_replenishment_id(
        &self,
        replenishment_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Arc<[ReplenishmentPaymentEntity]>, DaoError> {
        query_as::<_, ReplenishmentPaymentDb>(
            "SELECT id, replenishment_id, amount_cents, executed_at, succeeded, update_version FROM replenishment_payment WHERE replenishment_id = ? ORDER BY executed_at",
        )
        .bind(replenishment_id.as_bytes().to_vec())
        .fetch_all(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?
        .iter()
        .map(ReplenishmentPaymentEntity::try_from)
        .collect::<Result<Arc<[ReplenishmentPaymentEntity]>, DaoError>>()
    }

    async fn count_by_replenishment_id(
        &self,
        replenishment_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<u32, DaoError> {
        let count: i64 = query_scalar(
            "SELECT COUNT(*) FROM replenishment_payment WHERE replenishment_id = ? AND succeeded = 1",
        )
        .bind(replenishment_id.as_bytes().to_vec())
        .fetch_one(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        Ok(count as u32)
    }

    async fn create(
        &self,
        entity: &ReplenishmentPaymentEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let executed_at = format_date_time(&entity.executed_at)?;
        query(
            "INSERT INTO replenishment_payment (id, replenishment_id, amount_cents, executed_at, succeeded, update_version, update_process) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entity.id.as_bytes().to_vec())
        .bind(entity.replenishment_id.as_bytes().to_vec())
        .bind(entity.amount_cents as i64)
        .bind(executed_at)
        .bind(entity.succeeded)
        .bind(entity.version.as_bytes().to_vec())
        .bind(process)
        .execute(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        Ok(())
    }
}
