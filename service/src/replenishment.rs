use std::fmt::Debug;
use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::permission::Authentication;
use crate::ServiceError;

/// Billing interval unit of a replenishment.
///
/// Month and year are fixed 30-day / 365-day approximations. Downstream job
/// timing relies on the approximation being consistent, so this must not be
/// replaced with calendar-accurate arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
    Year,
    Custom,
}
impl IntervalUnit {
    pub fn milliseconds(&self) -> u64 {
        match self {
            Self::Day => 86_400_000,
            Self::Week => 604_800_000,
            Self::Month => 2_592_000_000,
            Self::Year => 31_536_000_000,
            Self::Custom => 1_000,
        }
    }

    pub fn period_ms(&self, interval: u32) -> u64 {
        u64::from(interval) * self.milliseconds()
    }
}
impl From<dao::replenishment::IntervalUnitEntity> for IntervalUnit {
    fn from(unit: dao::replenishment::IntervalUnitEntity) -> Self {
        match unit {
            dao::replenishment::IntervalUnitEntity::Day => Self::Day,
            dao::replenishment::IntervalUnitEntity::Week => Self::Week,
            dao::replenishment::IntervalUnitEntity::Month => Self::Month,
            dao::replenishment::IntervalUnitEntity::Year => Self::Year,
            dao::replenishment::IntervalUnitEntity::Custom => Self::Custom,
        }
    }
}
impl From<IntervalUnit> for dao::replenishment::IntervalUnitEntity {
    fn from(unit: IntervalUnit) -> Self {
        match unit {
            IntervalUnit::Day => Self::Day,
            IntervalUnit::Week => Self::Week,
            IntervalUnit::Month => Self::Month,
            IntervalUnit::Year => Self::Year,
            IntervalUnit::Custom => Self::Custom,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplenishmentStatus {
    Scheduled,
    Active,
    Canceled,
    Finished,
}
impl ReplenishmentStatus {
    /// Terminal records accept no further executions or updates.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::Finished)
    }
}
impl From<dao::replenishment::ReplenishmentStatusEntity> for ReplenishmentStatus {
    fn from(status: dao::replenishment::ReplenishmentStatusEntity) -> Self {
        match status {
            dao::replenishment::ReplenishmentStatusEntity::Scheduled => Self::Scheduled,
            dao::replenishment::ReplenishmentStatusEntity::Active => Self::Active,
            dao::replenishment::ReplenishmentStatusEntity::Canceled => Self::Canceled,
            dao::replenishment::ReplenishmentStatusEntity::Finished => Self::Finished,
        }
    }
}
impl From<ReplenishmentStatus> for dao::replenishment::ReplenishmentStatusEntity {
    fn from(status: ReplenishmentStatus) -> Self {
        match status {
            ReplenishmentStatus::Scheduled => Self::Scheduled,
            ReplenishmentStatus::Active => Self::Active,
            ReplenishmentStatus::Canceled => Self::Canceled,
            ReplenishmentStatus::Finished => Self::Finished,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionRejection {
    FinishedImmutable,
    ScheduledRequiresStartDate,
    ActiveRejectsStartDate,
    CanceledImmutable,
}
impl Display for TransitionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FinishedImmutable => write!(f, "finished replenishments are immutable"),
            Self::ScheduledRequiresStartDate => write!(
                f,
                "a scheduled replenishment requires a new start date on update"
            ),
            Self::ActiveRejectsStartDate => write!(
                f,
                "an active replenishment must not be given a new start date"
            ),
            Self::CanceledImmutable => write!(
                f,
                "canceled replenishments cannot be updated, remove and recreate instead"
            ),
        }
    }
}

/// Update guard of the replenishment state machine, checked in a fixed order.
/// Only scheduled records with an explicit new start date and active records
/// without one may be updated.
pub fn allowed_update(
    status: ReplenishmentStatus,
    has_new_start_date: bool,
) -> Result<(), TransitionRejection> {
    match status {
        ReplenishmentStatus::Finished => Err(TransitionRejection::FinishedImmutable),
        ReplenishmentStatus::Scheduled if !has_new_start_date => {
            Err(TransitionRejection::ScheduledRequiresStartDate)
        }
        ReplenishmentStatus::Active if has_new_start_date => {
            Err(TransitionRejection::ActiveRejectsStartDate)
        }
        ReplenishmentStatus::Canceled => Err(TransitionRejection::CanceledImmutable),
        ReplenishmentStatus::Scheduled | ReplenishmentStatus::Active => Ok(()),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_price_cents: u32,
}
impl From<&dao::replenishment::OrderLineEntity> for OrderLine {
    fn from(line: &dao::replenishment::OrderLineEntity) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
        }
    }
}
impl From<&OrderLine> for dao::replenishment::OrderLineEntity {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
        }
    }
}

/// The order placed on each cycle: line items, the stored payment method and
/// the shipping country.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTemplate {
    pub lines: Arc<[OrderLine]>,
    pub payment_method: Arc<str>,
    pub shipping_country: Arc<str>,
}
impl OrderTemplate {
    pub fn total_cents(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity) * u64::from(line.unit_price_cents))
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replenishment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub scheduler_id: Arc<str>,
    pub next_job_id: Option<Arc<str>>,
    pub template: OrderTemplate,
    pub interval: u32,
    pub unit: IntervalUnit,
    pub start_date: PrimitiveDateTime,
    pub end_date: Option<PrimitiveDateTime>,
    pub times: Option<u32>,
    pub executions: u32,
    pub last_payment_date: Option<PrimitiveDateTime>,
    pub next_payment_date: Option<PrimitiveDateTime>,
    pub status: ReplenishmentStatus,
    pub created: PrimitiveDateTime,
    pub version: Uuid,
}
impl From<&dao::replenishment::ReplenishmentEntity> for Replenishment {
    fn from(entity: &dao::replenishment::ReplenishmentEntity) -> Self {
        Self {
            id: entity.id,
            customer_id: entity.customer_id,
            scheduler_id: entity.scheduler_id.clone(),
            next_job_id: entity.next_job_id.clone(),
            template: OrderTemplate {
                lines: entity.lines.iter().map(OrderLine::from).collect(),
                payment_method: entity.payment_method.clone(),
                shipping_country: entity.shipping_country.clone(),
            },
            interval: entity.interval,
            unit: entity.unit.into(),
            start_date: entity.start_date,
            end_date: entity.end_date,
            times: entity.times,
            executions: entity.executions,
            last_payment_date: entity.last_payment_date,
            next_payment_date: entity.next_payment_date,
            status: entity.status.into(),
            created: entity.created,
            version: entity.version,
        }
    }
}
impl From<&Replenishment> for dao::replenishment::ReplenishmentEntity {
    fn from(replenishment: &Replenishment) -> Self {
        Self {
            id: replenishment.id,
            customer_id: replenishment.customer_id,
            scheduler_id: replenishment.scheduler_id.clone(),
            next_job_id: replenishment.next_job_id.clone(),
            lines: replenishment
                .template
                .lines
                .iter()
                .map(dao::replenishment::OrderLineEntity::from)
                .collect(),
            payment_method: replenishment.template.payment_method.clone(),
            shipping_country: replenishment.template.shipping_country.clone(),
            interval: replenishment.interval,
            unit: replenishment.unit.into(),
            start_date: replenishment.start_date,
            end_date: replenishment.end_date,
            times: replenishment.times,
            executions: replenishment.executions,
            last_payment_date: replenishment.last_payment_date,
            next_payment_date: replenishment.next_payment_date,
            status: replenishment.status.into(),
            created: replenishment.created,
            version: replenishment.version,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplenishmentPayment {
    pub id: Uuid,
    pub replenishment_id: Uuid,
    pub amount_cents: u64,
    pub executed_at: PrimitiveDateTime,
    pub succeeded: bool,
}
impl From<&dao::replenishment_payment::ReplenishmentPaymentEntity> for ReplenishmentPayment {
    fn from(entity: &dao::replenishment_payment::ReplenishmentPaymentEntity) -> Self {
        Self {
            id: entity.id,
            replenishment_id: entity.replenishment_id,
            amount_cents: entity.amount_cents,
            executed_at: entity.executed_at,
            succeeded: entity.succeeded,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplenishmentRequest {
    pub customer_id: Uuid,
    pub template: OrderTemplate,
    pub interval: u32,
    pub unit: IntervalUnit,
    pub trial_start: Option<PrimitiveDateTime>,
    pub expiry: Option<PrimitiveDateTime>,
    pub times: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplenishmentUpdate {
    pub template: OrderTemplate,
    pub interval: u32,
    pub unit: IntervalUnit,
    pub new_start_date: Option<PrimitiveDateTime>,
}

#[automock(type Context=(); type Transaction=dao::MockTransaction;)]
#[async_trait]
pub trait ReplenishmentService {
    type Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;
    type Transaction: dao::Transaction + Send + Sync + Clone + Debug + 'static;

    async fn create_replenishment(
        &self,
        request: &ReplenishmentRequest,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Replenishment, ServiceError>;

    async fn update_replenishment(
        &self,
        customer_id: Uuid,
        replenishment_id: Uuid,
        update: &ReplenishmentUpdate,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Replenishment, ServiceError>;

    async fn toggle_cancel_status(
        &self,
        customer_id: Uuid,
        replenishment_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Replenishment, ServiceError>;

    async fn remove_replenishment(
        &self,
        customer_id: Uuid,
        replenishment_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError>;

    async fn get_replenishment(
        &self,
        replenishment_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Replenishment, ServiceError>;

    async fn get_for_customer(
        &self,
        customer_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Replenishment]>, ServiceError>;

    async fn get_payments(
        &self,
        replenishment_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[ReplenishmentPayment]>, ServiceError>;

    /// Re-registers the job-scheduler entry of every non-terminal record.
    /// Called once on boot so the queue survives process restarts. Returns
    /// the number of restored entries.
    async fn restore_schedulers(
        &self,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<u32, ServiceError>;
}
