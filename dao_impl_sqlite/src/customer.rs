use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    customer::{CustomerDao, CustomerEntity},
    DaoError,
};
use sqlx::{query, query_as};
use uuid::Uuid;

use crate::{format_date_time, parse_date_time, ResultDbErrorExt, TransactionImpl};

pub struct CustomerDaoImpl {
    pub _pool: Arc<sqlx::SqlitePool>,
}
impl CustomerDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { _pool: pool }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerDb {
    id: Vec<u8>,
    name: String,
    email: String,
    country: String,
    deleted: Option<String>,
    update_version: Vec<u8>,
}
impl TryFrom<&CustomerDb> for CustomerEntity {
    type Error = DaoError;
    fn try_from(customer: &CustomerDb) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::from_slice(customer.id.as_ref())?,
            name: customer.name.as_str().into(),
            email: customer.email.as_str().into(),
            country: customer.country.as_str().into(),
            deleted: customer
                .deleted
                .as_deref()
                .map(parse_date_time)
                .transpose()?,
            version: Uuid::from_slice(customer.update_version.as_ref())?,
        })
    }
}

const SELECT_COLUMNS: &str = "id, name, email, country, deleted, update_version";

#[async_trait]
impl CustomerDao for CustomerDaoImpl {
    type Transaction = TransactionImpl;

    async fn all(&self, tx: Self::Transaction) -> Result<Arc<[CustomerEntity]>, DaoError> {
        query_as::<_, CustomerDb>(&format!(
            "SELECT {SELECT_COLUMNS} FROM customer WHERE deleted IS NULL"
        ))
        .fetch_all(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?
        .iter()
        .map(CustomerEntity::try_from)
        .collect::<Result<Arc<[CustomerEntity]>, DaoError>>()
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<CustomerEntity>, DaoError> {
        query_as::<_, CustomerDb>(&format!(
            "SELECT {SELECT_COLUMNS} FROM customer WHERE id = ?"
        ))
        .bind(id.as_bytes().to_vec())
        .fetch_optional(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?
        .as_ref()
        .map(CustomerEntity::try_from)
        .transpose()
    }

    async fn create(
        &self,
        entity: &CustomerEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let deleted = entity
            .deleted
            .as_ref()
            .map(format_date_time)
            .transpose()?;
        query(
            "INSERT INTO customer (id, name, email, country, deleted, update_version, update_process) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entity.id.as_bytes().to_vec())
        .bind(entity.name.as_ref())
        .bind(entity.email.as_ref())
        .bind(entity.country.as_ref())
        .bind(deleted)
        .bind(entity.version.as_bytes().to_vec())
        .bind(process)
        .execute(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        Ok(())
    }

    async fn update(
        &self,
        entity: &CustomerEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let deleted = entity
            .deleted
            .as_ref()
            .map(format_date_time)
            .transpose()?;
        query(
            "UPDATE customer SET name = ?, email = ?, country = ?, deleted = ?, update_version = ?, update_process = ? WHERE id = ?",
        )
        .bind(entity.name.as_ref())
        .bind(entity.email.as_ref())
        .bind(entity.country.as_ref())
        .bind(deleted)
        .bind(entity.version.as_bytes().to_vec())
        .bind(process)
        .bind(entity.id.as_bytes().to_vec())
        .execute(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        Ok(())
    }
}
