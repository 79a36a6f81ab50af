use std::sync::Arc;

use crate::gen_service_impl;
use async_trait::async_trait;
use dao::{
    customer::CustomerDao, replenishment::ReplenishmentDao,
    replenishment_payment::ReplenishmentPaymentDao, TransactionDao,
};
use service::{
    cache::CacheService,
    clock::ClockService,
    job_queue::{JobQueueService, JobTemplate, RepeatRule, ReplenishmentJobPayload},
    permission::{Authentication, SHOP_PRIVILEGE},
    replenishment::{
        allowed_update, OrderTemplate, Replenishment, ReplenishmentPayment, ReplenishmentRequest,
        ReplenishmentService, ReplenishmentStatus, ReplenishmentUpdate,
    },
    uuid_service::UuidService,
    PermissionService, ServiceError, ValidationFailureItem,
};
use time::PrimitiveDateTime;
use tracing::{error, warn};
use uuid::Uuid;

pub const REPLENISHMENT_SERVICE_PROCESS: &str = "replenishment-service";

/// Redis hash holding `{customer_id}:{replenishment_id}` -> scheduler id
/// lookup pointers.
pub const SCHEDULER_LOOKUP_KEY: &str = "replenishment:schedulers";

const REPLENISHMENT_JOB_NAME: &str = "replenishment-cycle";

gen_service_impl! {
    struct ReplenishmentServiceImpl: service::replenishment::ReplenishmentService = ReplenishmentServiceDeps {
        ReplenishmentDao: dao::replenishment::ReplenishmentDao<Transaction = Self::Transaction> = replenishment_dao,
        ReplenishmentPaymentDao: dao::replenishment_payment::ReplenishmentPaymentDao<Transaction = Self::Transaction> = replenishment_payment_dao,
        CustomerDao: dao::customer::CustomerDao<Transaction = Self::Transaction> = customer_dao,
        TransactionDao: dao::TransactionDao<Transaction = Self::Transaction> = transaction_dao,
        PermissionService: service::PermissionService<Context = Self::Context> = permission_service,
        ClockService: service::clock::ClockService = clock_service,
        UuidService: service::uuid_service::UuidService = uuid_service,
        JobQueueService: service::job_queue::JobQueueService = job_queue_service,
        CacheService: service::cache::CacheService = cache_service
    }
}

fn validate_request(template: &OrderTemplate, interval: u32) -> Result<(), ServiceError> {
    let mut failures: Vec<ValidationFailureItem> = Vec::new();
    if template.lines.is_empty() {
        failures.push(ValidationFailureItem::Empty("order lines".into()));
    }
    if template
        .lines
        .iter()
        .any(|line| line.quantity == 0)
    {
        failures.push(ValidationFailureItem::InvalidValue("quantity".into()));
    }
    if template.payment_method.is_empty() {
        failures.push(ValidationFailureItem::Empty("payment method".into()));
    }
    if template.shipping_country.is_empty() {
        failures.push(ValidationFailureItem::Empty("shipping country".into()));
    }
    if interval == 0 {
        failures.push(ValidationFailureItem::InvalidValue("interval".into()));
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(failures.into()))
    }
}

fn date_after(from: PrimitiveDateTime, period_ms: u64) -> PrimitiveDateTime {
    from + time::Duration::milliseconds(i64::try_from(period_ms).unwrap_or(i64::MAX))
}

fn repeat_rule(replenishment: &Replenishment, period_ms: u64, first: PrimitiveDateTime) -> RepeatRule {
    RepeatRule {
        every_ms: period_ms,
        start_date: Some(first),
        end_date: replenishment.end_date,
        limit: replenishment
            .times
            .map(|times| times.saturating_sub(replenishment.executions)),
    }
}

fn job_template(
    replenishment: &Replenishment,
    period_ms: u64,
    first: PrimitiveDateTime,
) -> JobTemplate {
    JobTemplate {
        name: REPLENISHMENT_JOB_NAME.into(),
        payload: ReplenishmentJobPayload {
            customer_id: replenishment.customer_id,
            template: replenishment.template.clone(),
            start_date: first,
            end_date: replenishment.end_date,
            period_ms,
        },
    }
}

fn lookup_field(customer_id: Uuid, replenishment_id: Uuid) -> String {
    format!("{customer_id}:{replenishment_id}")
}

impl<Deps: ReplenishmentServiceDeps> ReplenishmentServiceImpl<Deps> {
    /// First guard of every mutating operation: the customer must exist and
    /// must not be soft-deleted.
    async fn ensure_customer(
        &self,
        customer_id: Uuid,
        tx: Deps::Transaction,
    ) -> Result<(), ServiceError> {
        let customer = self.customer_dao.find_by_id(customer_id, tx).await?;
        if !customer.is_some_and(|customer| customer.deleted.is_none()) {
            return Err(ServiceError::CustomerNotFound(customer_id));
        }
        Ok(())
    }

    /// Registers the scheduler entry and returns the produced job id.
    /// A queue which answers without a handle aborts the whole operation.
    async fn upsert_scheduler(
        &self,
        replenishment: &Replenishment,
        period_ms: u64,
        first: PrimitiveDateTime,
    ) -> Result<Arc<str>, ServiceError> {
        let handle = self
            .job_queue_service
            .upsert_job_scheduler(
                replenishment.scheduler_id.as_ref(),
                &repeat_rule(replenishment, period_ms, first),
                &job_template(replenishment, period_ms, first),
            )
            .await?
            .ok_or_else(|| ServiceError::SchedulingFailure(replenishment.scheduler_id.clone()))?;
        Ok(handle.job_id)
    }

    async fn find_owned(
        &self,
        customer_id: Uuid,
        replenishment_id: Uuid,
        tx: Deps::Transaction,
    ) -> Result<Replenishment, ServiceError> {
        let entity = self
            .replenishment_dao
            .find_by_id(replenishment_id, tx)
            .await?
            .ok_or(ServiceError::ReplenishmentNotFound(replenishment_id))?;
        if entity.customer_id != customer_id {
            return Err(ServiceError::ReplenishmentNotFound(replenishment_id));
        }
        Ok(Replenishment::from(&entity))
    }

    /// Executed payment rows are the ground truth for the execution counter.
    /// The stored counter can fall behind when a cycle and an update race.
    async fn reconciled_executions(
        &self,
        replenishment: &Replenishment,
        tx: Deps::Transaction,
    ) -> Result<u32, ServiceError> {
        let actual = self
            .replenishment_payment_dao
            .count_by_replenishment_id(replenishment.id, tx)
            .await?;
        if actual != replenishment.executions {
            warn!(
                "Execution counter of replenishment {} drifted: stored {}, payments {}",
                replenishment.id, replenishment.executions, actual
            );
        }
        Ok(actual)
    }
}

#[async_trait]
impl<Deps: ReplenishmentServiceDeps> ReplenishmentService for ReplenishmentServiceImpl<Deps> {
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn create_replenishment(
        &self,
        request: &ReplenishmentRequest,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Replenishment, ServiceError> {
        self.permission_service
            .check_permission(SHOP_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;

        self.ensure_customer(request.customer_id, tx.clone()).await?;
        validate_request(&request.template, request.interval)?;

        let now = self.clock_service.date_time_now();
        let start_date = request.trial_start.unwrap_or(now);
        let period_ms = request.unit.period_ms(request.interval);
        let id = self.uuid_service.new_uuid("replenishment-id");
        let scheduler_id: Arc<str> = format!(
            "replenishment-{}-{}",
            request.customer_id,
            self.uuid_service.new_uuid("scheduler-id")
        )
        .into();

        let mut replenishment = Replenishment {
            id,
            customer_id: request.customer_id,
            scheduler_id,
            next_job_id: None,
            template: request.template.clone(),
            interval: request.interval,
            unit: request.unit,
            start_date,
            end_date: request.expiry,
            times: request.times,
            executions: 0,
            last_payment_date: None,
            next_payment_date: Some(start_date),
            // The worker promotes to Active on the first successful cycle.
            status: ReplenishmentStatus::Scheduled,
            created: now,
            version: self.uuid_service.new_uuid("replenishment-version"),
        };

        // Queue registration comes first. A record without a scheduler entry
        // would never execute, a dangling entry is drained by the worker.
        let job_id = self
            .upsert_scheduler(&replenishment, period_ms, start_date)
            .await?;
        replenishment.next_job_id = Some(job_id);

        self.replenishment_dao
            .create(
                &(&replenishment).into(),
                REPLENISHMENT_SERVICE_PROCESS,
                tx.clone(),
            )
            .await?;
        self.cache_service
            .hset(
                SCHEDULER_LOOKUP_KEY,
                &lookup_field(replenishment.customer_id, replenishment.id),
                replenishment.scheduler_id.as_ref(),
            )
            .await?;

        self.transaction_dao.commit(tx).await?;
        Ok(replenishment)
    }

    async fn update_replenishment(
        &self,
        customer_id: Uuid,
        replenishment_id: Uuid,
        update: &ReplenishmentUpdate,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Replenishment, ServiceError> {
        self.permission_service
            .check_permission(SHOP_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;

        self.ensure_customer(customer_id, tx.clone()).await?;
        let mut replenishment = self
            .find_owned(customer_id, replenishment_id, tx.clone())
            .await?;
        allowed_update(replenishment.status, update.new_start_date.is_some())
            .map_err(ServiceError::InvalidStateTransition)?;
        validate_request(&update.template, update.interval)?;

        let now = self.clock_service.date_time_now();
        let period_ms = update.unit.period_ms(update.interval);
        replenishment.template = update.template.clone();
        replenishment.interval = update.interval;
        replenishment.unit = update.unit;

        let first = match update.new_start_date {
            // Scheduled record, the trial start moves.
            Some(new_start_date) => {
                replenishment.start_date = new_start_date;
                new_start_date
            }
            // Active record, the next charge derives from the last one.
            None => {
                replenishment.executions = self
                    .reconciled_executions(&replenishment, tx.clone())
                    .await?;
                date_after(replenishment.last_payment_date.unwrap_or(now), period_ms)
            }
        };
        replenishment.next_payment_date = Some(first);

        let job_id = self
            .upsert_scheduler(&replenishment, period_ms, first)
            .await?;
        replenishment.next_job_id = Some(job_id);
        replenishment.version = self.uuid_service.new_uuid("replenishment-version");

        self.replenishment_dao
            .update(
                &(&replenishment).into(),
                REPLENISHMENT_SERVICE_PROCESS,
                tx.clone(),
            )
            .await?;

        self.transaction_dao.commit(tx).await?;
        Ok(replenishment)
    }

    async fn toggle_cancel_status(
        &self,
        customer_id: Uuid,
        replenishment_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Replenishment, ServiceError> {
        self.permission_service
            .check_permission(SHOP_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;

        self.ensure_customer(customer_id, tx.clone()).await?;
        let mut replenishment = self
            .find_owned(customer_id, replenishment_id, tx.clone())
            .await?;
        match replenishment.status {
            ReplenishmentStatus::Finished => {
                return Err(ServiceError::InvalidStateTransition(
                    service::replenishment::TransitionRejection::FinishedImmutable,
                ));
            }
            ReplenishmentStatus::Scheduled | ReplenishmentStatus::Active => {
                self.job_queue_service
                    .remove_job_scheduler(replenishment.scheduler_id.as_ref())
                    .await?;
                self.cache_service
                    .hdel(
                        SCHEDULER_LOOKUP_KEY,
                        &lookup_field(customer_id, replenishment_id),
                    )
                    .await?;
                replenishment.status = ReplenishmentStatus::Canceled;
                replenishment.next_job_id = None;
                replenishment.next_payment_date = None;
            }
            ReplenishmentStatus::Canceled => {
                let now = self.clock_service.date_time_now();
                let period_ms = replenishment.unit.period_ms(replenishment.interval);
                // A record that never ran goes back to Scheduled; Active is
                // reserved for records with at least one execution.
                let (status, first) = if replenishment.executions == 0 {
                    (ReplenishmentStatus::Scheduled, replenishment.start_date)
                } else {
                    (
                        ReplenishmentStatus::Active,
                        date_after(replenishment.last_payment_date.unwrap_or(now), period_ms),
                    )
                };
                replenishment.status = status;
                replenishment.next_payment_date = Some(first);
                let job_id = self
                    .upsert_scheduler(&replenishment, period_ms, first)
                    .await?;
                replenishment.next_job_id = Some(job_id);
                self.cache_service
                    .hset(
                        SCHEDULER_LOOKUP_KEY,
                        &lookup_field(customer_id, replenishment_id),
                        replenishment.scheduler_id.as_ref(),
                    )
                    .await?;
            }
        }
        replenishment.version = self.uuid_service.new_uuid("replenishment-version");

        self.replenishment_dao
            .update(
                &(&replenishment).into(),
                REPLENISHMENT_SERVICE_PROCESS,
                tx.clone(),
            )
            .await?;

        self.transaction_dao.commit(tx).await?;
        Ok(replenishment)
    }

    async fn remove_replenishment(
        &self,
        customer_id: Uuid,
        replenishment_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError> {
        self.permission_service
            .check_permission(SHOP_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;

        self.ensure_customer(customer_id, tx.clone()).await?;
        let replenishment = self
            .find_owned(customer_id, replenishment_id, tx.clone())
            .await?;
        // Removing an absent scheduler entry is a no-op, so a record whose
        // entry was already drained deletes cleanly.
        self.job_queue_service
            .remove_job_scheduler(replenishment.scheduler_id.as_ref())
            .await?;
        self.cache_service
            .hdel(
                SCHEDULER_LOOKUP_KEY,
                &lookup_field(customer_id, replenishment_id),
            )
            .await?;
        // Payment rows stay behind for bookkeeping.
        self.replenishment_dao
            .delete(replenishment_id, tx.clone())
            .await?;

        self.transaction_dao.commit(tx).await?;
        Ok(())
    }

    async fn get_replenishment(
        &self,
        replenishment_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Replenishment, ServiceError> {
        self.permission_service
            .check_permission(SHOP_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let entity = self
            .replenishment_dao
            .find_by_id(replenishment_id, tx.clone())
            .await?
            .ok_or(ServiceError::ReplenishmentNotFound(replenishment_id))?;
        self.transaction_dao.commit(tx).await?;
        Ok(Replenishment::from(&entity))
    }

    async fn get_for_customer(
        &self,
        customer_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Replenishment]>, ServiceError> {
        self.permission_service
            .check_permission(SHOP_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let replenishments = self
            .replenishment_dao
            .find_by_customer_id(customer_id, tx.clone())
            .await?
            .iter()
            .map(Replenishment::from)
            .collect();
        self.transaction_dao.commit(tx).await?;
        Ok(replenishments)
    }

    async fn get_payments(
        &self,
        replenishment_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[ReplenishmentPayment]>, ServiceError> {
        self.permission_service
            .check_permission(SHOP_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        if self
            .replenishment_dao
            .find_by_id(replenishment_id, tx.clone())
            .await?
            .is_none()
        {
            return Err(ServiceError::ReplenishmentNotFound(replenishment_id));
        }
        let payments = self
            .replenishment_payment_dao
            .find_by_replenishment_id(replenishment_id, tx.clone())
            .await?
            .iter()
            .map(ReplenishmentPayment::from)
            .collect();
        self.transaction_dao.commit(tx).await?;
        Ok(payments)
    }

    async fn restore_schedulers(
        &self,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<u32, ServiceError> {
        self.permission_service
            .check_permission(SHOP_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;

        let entities = self.replenishment_dao.all_non_terminal(tx.clone()).await?;
        let mut restored = 0;
        for entity in entities.iter() {
            let mut replenishment = Replenishment::from(entity);
            let period_ms = replenishment.unit.period_ms(replenishment.interval);
            let first = replenishment
                .next_payment_date
                .unwrap_or(replenishment.start_date);
            match self.upsert_scheduler(&replenishment, period_ms, first).await {
                Ok(job_id) => {
                    if replenishment.next_job_id.as_ref() != Some(&job_id) {
                        replenishment.next_job_id = Some(job_id);
                        replenishment.version =
                            self.uuid_service.new_uuid("replenishment-version");
                        self.replenishment_dao
                            .update(
                                &(&replenishment).into(),
                                REPLENISHMENT_SERVICE_PROCESS,
                                tx.clone(),
                            )
                            .await?;
                    }
                    self.cache_service
                        .hset(
                            SCHEDULER_LOOKUP_KEY,
                            &lookup_field(replenishment.customer_id, replenishment.id),
                            replenishment.scheduler_id.as_ref(),
                        )
                        .await?;
                    restored += 1;
                }
                Err(err) => {
                    error!(
                        "Could not restore scheduler {}: {}",
                        replenishment.scheduler_id, err
                    );
                }
            }
        }

        self.transaction_dao.commit(tx).await?;
        Ok(restored)
    }
}
