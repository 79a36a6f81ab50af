use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    replenishment::{
        IntervalUnitEntity, OrderLineEntity, ReplenishmentDao, ReplenishmentEntity,
        ReplenishmentStatusEntity,
    },
    DaoError,
};
use sqlx::{query, query_as};
use uuid::Uuid;

use crate::{format_date_time, parse_date_time, ResultDbErrorExt, TransactionImpl};

pub struct ReplenishmentDaoImpl {
    pub _pool: Arc<sqlx::SqlitePool>,
}
impl ReplenishmentDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { _pool: pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReplenishmentDb {
    id: Vec<u8>,
    customer_id: Vec<u8>,
    scheduler_id: String,
    next_job_id: Option<String>,
    payment_method: String,
    shipping_country: String,
    interval: i64,
    unit: String,
    start_date: String,
    end_date: Option<String>,
    times: Option<i64>,
    executions: i64,
    last_payment_date: Option<String>,
    next_payment_date: Option<String>,
    status: String,
    created: String,
    update_version: Vec<u8>,
}

#[derive(sqlx::FromRow)]
struct OrderLineDb {
    product_id: Vec<u8>,
    quantity: i64,
    unit_price_cents: i64,
}
impl TryFrom<&OrderLineDb> for OrderLineEntity {
    type Error = DaoError;
    fn try_from(line: &OrderLineDb) -> Result<Self, Self::Error> {
        Ok(Self {
            product_id: Uuid::from_slice(line.product_id.as_ref())?,
            quantity: line.quantity as u32,
            unit_price_cents: line.unit_price_cents as u32,
        })
    }
}

fn to_entity(
    db: &ReplenishmentDb,
    lines: Arc<[OrderLineEntity]>,
) -> Result<ReplenishmentEntity, DaoError> {
    Ok(ReplenishmentEntity {
        id: Uuid::from_slice(db.id.as_ref())?,
        customer_id: Uuid::from_slice(db.customer_id.as_ref())?,
        scheduler_id: db.scheduler_id.as_str().into(),
        next_job_id: db.next_job_id.as_deref().map(Arc::from),
        lines,
        payment_method: db.payment_method.as_str().into(),
        shipping_country: db.shipping_country.as_str().into(),
        interval: db.interval as u32,
        unit: IntervalUnitEntity::try_from(db.unit.as_str())?,
        start_date: parse_date_time(&db.start_date)?,
        end_date: db.end_date.as_deref().map(parse_date_time).transpose()?,
        times: db.times.map(|times| times as u32),
        executions: db.executions as u32,
        last_payment_date: db
            .last_payment_date
            .as_deref()
            .map(parse_date_time)
            .transpose()?,
        next_payment_date: db
            .next_payment_date
            .as_deref()
            .map(parse_date_time)
            .transpose()?,
        status: ReplenishmentStatusEntity::try_from(db.status.as_str())?,
        created: parse_date_time(&db.created)?,
        version: Uuid::from_slice(db.update_version.as_ref())?,
    })
}

const SELECT_COLUMNS: &str = "id, customer_id, scheduler_id, next_job_id, payment_method, \
     shipping_country, interval, unit, start_date, end_date, times, executions, \
     last_payment_date, next_payment_date, status, created, update_version";

impl ReplenishmentDaoImpl {
    async fn load_lines(
        &self,
        replenishment_id: &[u8],
        tx: &TransactionImpl,
    ) -> Result<Arc<[OrderLineEntity]>, DaoError> {
        query_as::<_, OrderLineDb>(
            "SELECT product_id, quantity, unit_price_cents FROM replenishment_order_line WHERE replenishment_id = ?",
        )
        .bind(replenishment_id.to_vec())
        .fetch_all(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?
        .iter()
        .map(OrderLineEntity::try_from)
        .collect::<Result<Arc<[OrderLineEntity]>, DaoError>>()
    }

    async fn store_lines(
        &self,
        entity: &ReplenishmentEntity,
        tx: &TransactionImpl,
    ) -> Result<(), DaoError> {
        let id = entity.id.as_bytes().to_vec();
        query("DELETE FROM replenishment_order_line WHERE replenishment_id = ?")
            .bind(id.clone())
            .execute(tx.tx.lock().await.as_mut())
            .await
            .map_db_error()?;
        for line in entity.lines.iter() {
            query(
                "INSERT INTO replenishment_order_line (replenishment_id, product_id, quantity, unit_price_cents) VALUES (?, ?, ?, ?)",
            )
            .bind(id.clone())
            .bind(line.product_id.as_bytes().to_vec())
            .bind(i64::from(line.quantity))
            .bind(i64::from(line.unit_price_cents))
            .execute(tx.tx.lock().await.as_mut())
            .await
            .map_db_error()?;
        }
        Ok(())
    }

    async fn to_entities(
        &self,
        rows: &[ReplenishmentDb],
        tx: &TransactionImpl,
    ) -> Result<Arc<[ReplenishmentEntity]>, DaoError> {
        let mut entities = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = self.load_lines(&row.id, tx).await?;
            entities.push(to_entity(row, lines)?);
        }
        Ok(entities.into())
    }
}

#[async_trait]
impl ReplenishmentDao for ReplenishmentDaoImpl {
    type Transaction = TransactionImpl;

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<ReplenishmentEntity>, DaoError> {
        let row = query_as::<_, ReplenishmentDb>(&format!(
            "SELECT {SELECT_COLUMNS} FROM replenishment WHERE id = ?"
        ))
        .bind(id.as_bytes().to_vec())
        .fetch_optional(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        match row {
            Some(row) => {
                let lines = self.load_lines(&row.id, &tx).await?;
                Ok(Some(to_entity(&row, lines)?))
            }
            None => Ok(None),
        }
    }

    async fn find_by_scheduler_id(
        &self,
        scheduler_id: &str,
        tx: Self::Transaction,
    ) -> Result<Option<ReplenishmentEntity>, DaoError> {
        let row = query_as::<_, ReplenishmentDb>(&format!(
            "SELECT {SELECT_COLUMNS} FROM replenishment WHERE scheduler_id = ?"
        ))
        .bind(scheduler_id)
        .fetch_optional(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        match row {
            Some(row) => {
                let lines = self.load_lines(&row.id, &tx).await?;
                Ok(Some(to_entity(&row, lines)?))
            }
            None => Ok(None),
        }
    }

    async fn find_by_customer_id(
        &self,
        customer_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Arc<[ReplenishmentEntity]>, DaoError> {
        let rows = query_as::<_, ReplenishmentDb>(&format!(
            "SELECT {SELECT_COLUMNS} FROM replenishment WHERE customer_id = ?"
        ))
        .bind(customer_id.as_bytes().to_vec())
        .fetch_all(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        self.to_entities(&rows, &tx).await
    }

    async fn all_non_terminal(
        &self,
        tx: Self::Transaction,
    ) -> Result<Arc<[ReplenishmentEntity]>, DaoError> {
        let rows = query_as::<_, ReplenishmentDb>(&format!(
            "SELECT {SELECT_COLUMNS} FROM replenishment WHERE status IN ('scheduled', 'active')"
        ))
        .fetch_all(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        self.to_entities(&rows, &tx).await
    }

    async fn create(
        &self,
        entity: &ReplenishmentEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let start_date = format_date_time(&entity.start_date)?;
        let end_date = entity.end_date.as_ref().map(format_date_time).transpose()?;
        let last_payment_date = entity
            .last_payment_date
            .as_ref()
            .map(format_date_time)
            .transpose()?;
        let next_payment_date = entity
            .next_payment_date
            .as_ref()
            .map(format_date_time)
            .transpose()?;
        let created = format_date_time(&entity.created)?;
        query(
            "INSERT INTO replenishment (id, customer_id, scheduler_id, next_job_id, payment_method, shipping_country, interval, unit, start_date, end_date, times, executions, last_payment_date, next_payment_date, status, created, update_version, update_process) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entity.id.as_bytes().to_vec())
        .bind(entity.customer_id.as_bytes().to_vec())
        .bind(entity.scheduler_id.as_ref())
        .bind(entity.next_job_id.as_deref())
        .bind(entity.payment_method.as_ref())
        .bind(entity.shipping_country.as_ref())
        .bind(i64::from(entity.interval))
        .bind(entity.unit.as_str())
        .bind(start_date)
        .bind(end_date)
        .bind(entity.times.map(i64::from))
        .bind(i64::from(entity.executions))
        .bind(last_payment_date)
        .bind(next_payment_date)
        .bind(entity.status.as_str())
        .bind(created)
        .bind(entity.version.as_bytes().to_vec())
        .bind(process)
        .execute(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        self.store_lines(entity, &tx).await
    }

    async fn update(
        &self,
        entity: &ReplenishmentEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let start_date = format_date_time(&entity.start_date)?;
        let end_date = entity.end_date.as_ref().map(format_date_time).transpose()?;
        let last_payment_date = entity
            .last_payment_date
            .as_ref()
            .map(format_date_time)
            .transpose()?;
        let next_payment_date = entity
            .next_payment_date
            .as_ref()
            .map(format_date_time)
            .transpose()?;
        query(
            "UPDATE replenishment SET scheduler_id = ?, next_job_id = ?, payment_method = ?, shipping_country = ?, interval = ?, unit = ?, start_date = ?, end_date = ?, times = ?, executions = ?, last_payment_date = ?, next_payment_date = ?, status = ?, update_version = ?, update_process = ? WHERE id = ?",
        )
        .bind(entity.scheduler_id.as_ref())
        .bind(entity.next_job_id.as_deref())
        .bind(entity.payment_method.as_ref())
        .bind(entity.shipping_country.as_ref())
        .bind(i64::from(entity.interval))
        .bind(entity.unit.as_str())
        .bind(start_date)
        .bind(end_date)
        .bind(entity.times.map(i64::from))
        .bind(i64::from(entity.executions))
        .bind(last_payment_date)
        .bind(next_payment_date)
        .bind(entity.status.as_str())
        .bind(entity.version.as_bytes().to_vec())
        .bind(process)
        .bind(entity.id.as_bytes().to_vec())
        .execute(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        self.store_lines(entity, &tx).await
    }

    async fn delete(&self, id: Uuid, tx: Self::Transaction) -> Result<(), DaoError> {
        let id = id.as_bytes().to_vec();
        query("DELETE FROM replenishment_order_line WHERE replenishment_id = ?")
            .bind(id.clone())
            .execute(tx.tx.lock().await.as_mut())
            .await
            .map_db_error()?;
        query("DELETE FROM replenishment WHERE id = ?")
            .bind(id)
            .execute(tx.tx.lock().await.as_mut())
            .await
            .map_db_error()?;
        Ok(())
    }
}
