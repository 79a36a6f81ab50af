use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::DaoError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplenishmentStatusEntity {
    Scheduled,
    Active,
    Canceled,
    Finished,
}
impl ReplenishmentStatusEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Canceled => "canceled",
            Self::Finished => "finished",
        }
    }
}
impl TryFrom<&str> for ReplenishmentStatusEntity {
    type Error = DaoError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "scheduled" => Ok(Self::Scheduled),
            "active" => Ok(Self::Active),
            "canceled" => Ok(Self::Canceled),
            "finished" => Ok(Self::Finished),
            _ => Err(DaoError::EnumValueNotFound(value.into())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntervalUnitEntity {
    Day,
    Week,
    Month,
    Year,
    Custom,
}
impl IntervalUnitEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Custom => "custom",
        }
    }
}
impl TryFrom<&str> for IntervalUnitEntity {
    type Error = DaoError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "custom" => Ok(Self::Custom),
            _ => Err(DaoError::EnumValueNotFound(value.into())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderLineEntity {
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_price_cents: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplenishmentEntity {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Key of the external job-scheduler entry. Unique per record.
    pub scheduler_id: Arc<str>,
    pub next_job_id: Option<Arc<str>>,
    pub lines: Arc<[OrderLineEntity]>,
    pub payment_method: Arc<str>,
    pub shipping_country: Arc<str>,
    pub interval: u32,
    pub unit: IntervalUnitEntity,
    pub start_date: PrimitiveDateTime,
    pub end_date: Option<PrimitiveDateTime>,
    pub times: Option<u32>,
    pub executions: u32,
    pub last_payment_date: Option<PrimitiveDateTime>,
    pub next_payment_date: Option<PrimitiveDateTime>,
    pub status: ReplenishmentStatusEntity,
    pub created: PrimitiveDateTime,
    pub version: Uuid,
}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait ReplenishmentDao {
    type Transaction: crate::Transaction;

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<ReplenishmentEntity>, DaoError>;
    async fn find_by_scheduler_id(
        &self,
        scheduler_id: &str,
        tx: Self::Transaction,
    ) -> Result<Option<ReplenishmentEntity>, DaoError>;
    async fn find_by_customer_id(
        &self,
        customer_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Arc<[ReplenishmentEntity]>, DaoError>;
    async fn all_non_terminal(
        &self,
        tx: Self::Transaction,
    ) -> Result<Arc<[ReplenishmentEntity]>, DaoError>;
    async fn create(
        &self,
        entity: &ReplenishmentEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError>;
    async fn update(
        &self,
        entity: &ReplenishmentEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError>;
    async fn delete(&self, id: Uuid, tx: Self::Transaction) -> Result<(), DaoError>;
}
