use crate::gen_service_impl;
use async_trait::async_trait;
use dao::{
    replenishment::ReplenishmentDao, replenishment_payment::ReplenishmentPaymentDao,
    TransactionDao,
};
use service::{
    clock::ClockService,
    payment_gateway::{PaymentGatewayService, PaymentOutcome},
    permission::Authentication,
    replenishment::{Replenishment, ReplenishmentStatus},
    uuid_service::UuidService,
    worker::{CycleOutcome, ReplenishmentWorkerService},
    ServiceError,
};
use tracing::info;

pub const REPLENISHMENT_WORKER_PROCESS: &str = "replenishment-worker";

gen_service_impl! {
    struct ReplenishmentWorkerImpl: service::worker::ReplenishmentWorkerService = ReplenishmentWorkerDeps {
        ReplenishmentDao: dao::replenishment::ReplenishmentDao<Transaction = Self::Transaction> = replenishment_dao,
        ReplenishmentPaymentDao: dao::replenishment_payment::ReplenishmentPaymentDao<Transaction = Self::Transaction> = replenishment_payment_dao,
        TransactionDao: dao::TransactionDao<Transaction = Self::Transaction> = transaction_dao,
        PaymentGatewayService: service::payment_gateway::PaymentGatewayService = payment_gateway_service,
        ClockService: service::clock::ClockService = clock_service,
        UuidService: service::uuid_service::UuidService = uuid_service
    }
}

fn date_after(from: time::PrimitiveDateTime, period_ms: u64) -> time::PrimitiveDateTime {
    from + time::Duration::milliseconds(i64::try_from(period_ms).unwrap_or(i64::MAX))
}

#[async_trait]
impl<Deps: ReplenishmentWorkerDeps> ReplenishmentWorkerService for ReplenishmentWorkerImpl<Deps> {
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn execute_cycle(
        &self,
        scheduler_id: &str,
        _context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<CycleOutcome, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;

        let Some(entity) = self
            .replenishment_dao
            .find_by_scheduler_id(scheduler_id, tx.clone())
            .await?
        else {
            info!("No replenishment behind scheduler {}, skipping", scheduler_id);
            self.transaction_dao.commit(tx).await?;
            return Ok(CycleOutcome::Skipped);
        };
        let mut replenishment = Replenishment::from(&entity);
        if replenishment.status.is_terminal() {
            info!(
                "Replenishment {} is {:?}, skipping cycle",
                replenishment.id, replenishment.status
            );
            self.transaction_dao.commit(tx).await?;
            return Ok(CycleOutcome::Skipped);
        }

        let amount_cents = replenishment.template.total_cents();
        let outcome = self
            .payment_gateway_service
            .charge(
                replenishment.customer_id,
                replenishment.template.payment_method.as_ref(),
                amount_cents,
            )
            .await?;
        let now = self.clock_service.date_time_now();
        let succeeded = outcome == PaymentOutcome::Succeeded;

        // Every attempt leaves a payment row, declined ones included.
        let payment = dao::replenishment_payment::ReplenishmentPaymentEntity {
            id: self.uuid_service.new_uuid("replenishment-payment-id"),
            replenishment_id: replenishment.id,
            amount_cents,
            executed_at: now,
            succeeded,
            version: self.uuid_service.new_uuid("replenishment-payment-version"),
        };
        self.replenishment_payment_dao
            .create(&payment, REPLENISHMENT_WORKER_PROCESS, tx.clone())
            .await?;

        if !succeeded {
            info!(
                "Payment for replenishment {} declined, record not advanced",
                replenishment.id
            );
            self.transaction_dao.commit(tx).await?;
            return Ok(CycleOutcome::PaymentFailed);
        }

        replenishment.executions += 1;
        replenishment.last_payment_date = Some(now);
        if replenishment.status == ReplenishmentStatus::Scheduled {
            replenishment.status = ReplenishmentStatus::Active;
        }
        let finished = replenishment
            .times
            .is_some_and(|times| replenishment.executions >= times);
        if finished {
            replenishment.status = ReplenishmentStatus::Finished;
            replenishment.next_payment_date = None;
            replenishment.next_job_id = None;
        } else {
            let period_ms = replenishment.unit.period_ms(replenishment.interval);
            replenishment.next_payment_date = Some(date_after(now, period_ms));
        }
        replenishment.version = self.uuid_service.new_uuid("replenishment-version");

        self.replenishment_dao
            .update(
                &(&replenishment).into(),
                REPLENISHMENT_WORKER_PROCESS,
                tx.clone(),
            )
            .await?;

        self.transaction_dao.commit(tx).await?;
        if finished {
            Ok(CycleOutcome::Finished)
        } else {
            Ok(CycleOutcome::Charged)
        }
    }
}
