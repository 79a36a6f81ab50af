use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

pub mod customer;
pub mod replenishment;
pub mod replenishment_payment;

#[derive(Error, Debug)]
pub enum DaoError {
    #[error("Database query error: {0}")]
    DatabaseQueryError(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Could not parse uuid: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("Could not parse date time: {0}")]
    DateTimeParseError(#[from] time::error::Parse),

    #[error("Could not format date time: {0}")]
    DateTimeFormatError(#[from] time::error::Format),

    #[error("Unknown enum value: {0}")]
    EnumValueNotFound(Arc<str>),
}

/// Marker for a database transaction handle passed through the DAO layer.
pub trait Transaction: Clone + Send + Sync + Debug {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockTransaction;
impl Transaction for MockTransaction {}

#[automock(type Transaction = MockTransaction;)]
#[async_trait]
pub trait TransactionDao {
    type Transaction: Transaction + 'static;

    async fn new_transaction(&self) -> Result<Self::Transaction, DaoError>;
    async fn use_transaction(
        &self,
        tx: Option<Self::Transaction>,
    ) -> Result<Self::Transaction, DaoError>;
    async fn commit(&self, tx: Self::Transaction) -> Result<(), DaoError>;
}
