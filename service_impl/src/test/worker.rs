use std::sync::Arc;

use crate::test::error_test::generate_default_datetime;
use crate::worker::{ReplenishmentWorkerDeps, ReplenishmentWorkerImpl};
use dao::replenishment::{
    IntervalUnitEntity, MockReplenishmentDao, OrderLineEntity, ReplenishmentEntity,
    ReplenishmentStatusEntity,
};
use dao::replenishment_payment::MockReplenishmentPaymentDao;
use dao::{MockTransaction, MockTransactionDao};
use mockall::predicate::eq;
use service::clock::MockClockService;
use service::payment_gateway::{MockPaymentGatewayService, PaymentOutcome};
use service::permission::Authentication;
use service::uuid_service::MockUuidService;
use service::worker::{CycleOutcome, ReplenishmentWorkerService};
use time::Duration;
use uuid::{uuid, Uuid};

const SCHEDULER_ID: &str = "replenishment-cycle-test-scheduler";

fn default_replenishment_id() -> Uuid {
    uuid!("1b5b0e3c-95a8-4b5e-9d07-9aab40c33647")
}

fn default_customer_id() -> Uuid {
    uuid!("b7e5b70e-3f02-47ae-b600-20bc80c0f354")
}

fn default_version() -> Uuid {
    uuid!("f79c462a-8d4e-42e1-8171-db4dbd019e50")
}

fn entity_with_status(status: ReplenishmentStatusEntity) -> ReplenishmentEntity {
    let now = generate_default_datetime();
    ReplenishmentEntity {
        id: default_replenishment_id(),
        customer_id: default_customer_id(),
        scheduler_id: SCHEDULER_ID.into(),
        next_job_id: Some("job-1".into()),
        lines: [OrderLineEntity {
            product_id: uuid!("a15a3c4a-6b71-4c32-b913-1a5db0e1a906"),
            quantity: 2,
            unit_price_cents: 500,
        }]
        .into(),
        payment_method: "pm-card".into(),
        shipping_country: "DE".into(),
        interval: 2,
        unit: IntervalUnitEntity::Day,
        start_date: now - Duration::days(10),
        end_date: None,
        times: None,
        executions: 0,
        last_payment_date: None,
        next_payment_date: Some(now),
        status,
        created: now - Duration::days(10),
        version: default_version(),
    }
}

pub struct WorkerDependencies {
    pub replenishment_dao: MockReplenishmentDao,
    pub replenishment_payment_dao: MockReplenishmentPaymentDao,
    pub payment_gateway_service: MockPaymentGatewayService,
}

impl ReplenishmentWorkerDeps for WorkerDependencies {
    type Context = ();
    type Transaction = MockTransaction;

    type ReplenishmentDao = MockReplenishmentDao;
    type ReplenishmentPaymentDao = MockReplenishmentPaymentDao;
    type TransactionDao = MockTransactionDao;
    type PaymentGatewayService = MockPaymentGatewayService;
    type ClockService = MockClockService;
    type UuidService = MockUuidService;
}

impl WorkerDependencies {
    pub fn build_service(self) -> ReplenishmentWorkerImpl<WorkerDependencies> {
        let mut transaction_dao = MockTransactionDao::new();
        transaction_dao
            .expect_use_transaction()
            .returning(|_| Ok(MockTransaction));
        transaction_dao.expect_commit().returning(|_| Ok(()));
        let mut clock_service = MockClockService::new();
        clock_service
            .expect_date_time_now()
            .returning(generate_default_datetime);
        let mut uuid_service = MockUuidService::new();
        uuid_service
            .expect_new_uuid()
            .returning(|_| default_version());

        ReplenishmentWorkerImpl {
            replenishment_dao: self.replenishment_dao.into(),
            replenishment_payment_dao: self.replenishment_payment_dao.into(),
            transaction_dao: Arc::new(transaction_dao),
            payment_gateway_service: self.payment_gateway_service.into(),
            clock_service: Arc::new(clock_service),
            uuid_service: Arc::new(uuid_service),
        }
    }
}

fn build_dependencies() -> WorkerDependencies {
    WorkerDependencies {
        replenishment_dao: MockReplenishmentDao::new(),
        replenishment_payment_dao: MockReplenishmentPaymentDao::new(),
        payment_gateway_service: MockPaymentGatewayService::new(),
    }
}

#[tokio::test]
async fn test_cycle_charges_and_advances() {
    let mut deps = build_dependencies();
    let now = generate_default_datetime();
    deps.replenishment_dao
        .expect_find_by_scheduler_id()
        .withf(|scheduler_id, _| scheduler_id == SCHEDULER_ID)
        .returning(|_, _| Ok(Some(entity_with_status(ReplenishmentStatusEntity::Scheduled))));
    deps.payment_gateway_service
        .expect_charge()
        .with(eq(default_customer_id()), eq("pm-card"), eq(1000u64))
        .returning(|_, _, _| Ok(PaymentOutcome::Succeeded));
    deps.replenishment_payment_dao
        .expect_create()
        .withf(|payment, process, _tx| {
            payment.succeeded
                && payment.amount_cents == 1000
                && payment.replenishment_id == default_replenishment_id()
                && process == "replenishment-worker"
        })
        .returning(|_, _, _| Ok(()));
    deps.replenishment_dao
        .expect_update()
        .withf(move |entity, process, _tx| {
            entity.executions == 1
                && entity.status == ReplenishmentStatusEntity::Active
                && entity.last_payment_date == Some(now)
                && entity.next_payment_date == Some(now + Duration::days(2))
                && process == "replenishment-worker"
        })
        .returning(|_, _, _| Ok(()));

    let service = deps.build_service();
    let outcome = service
        .execute_cycle(SCHEDULER_ID, Authentication::Full, None)
        .await
        .expect("Expected cycle outcome");
    assert_eq!(CycleOutcome::Charged, outcome);
}

#[tokio::test]
async fn test_cycle_declined_payment_is_recorded_but_not_advanced() {
    let mut deps = build_dependencies();
    deps.replenishment_dao
        .expect_find_by_scheduler_id()
        .returning(|_, _| Ok(Some(entity_with_status(ReplenishmentStatusEntity::Active))));
    deps.payment_gateway_service
        .expect_charge()
        .returning(|_, _, _| Ok(PaymentOutcome::Declined));
    deps.replenishment_payment_dao
        .expect_create()
        .withf(|payment, _, _| !payment.succeeded)
        .returning(|_, _, _| Ok(()));

    let service = deps.build_service();
    let outcome = service
        .execute_cycle(SCHEDULER_ID, Authentication::Full, None)
        .await
        .expect("Expected cycle outcome");
    assert_eq!(CycleOutcome::PaymentFailed, outcome);
}

#[tokio::test]
async fn test_cycle_without_record_is_skipped() {
    let mut deps = build_dependencies();
    deps.replenishment_dao
        .expect_find_by_scheduler_id()
        .returning(|_, _| Ok(None));

    let service = deps.build_service();
    let outcome = service
        .execute_cycle(SCHEDULER_ID, Authentication::Full, None)
        .await
        .expect("Expected cycle outcome");
    assert_eq!(CycleOutcome::Skipped, outcome);
}

#[tokio::test]
async fn test_cycle_terminal_record_is_skipped() {
    let mut deps = build_dependencies();
    deps.replenishment_dao
        .expect_find_by_scheduler_id()
        .returning(|_, _| Ok(Some(entity_with_status(ReplenishmentStatusEntity::Canceled))));

    let service = deps.build_service();
    let outcome = service
        .execute_cycle(SCHEDULER_ID, Authentication::Full, None)
        .await
        .expect("Expected cycle outcome");
    assert_eq!(CycleOutcome::Skipped, outcome);
}

#[tokio::test]
async fn test_cycle_reaching_occurrence_cap_finishes() {
    let mut deps = build_dependencies();
    deps.replenishment_dao.expect_find_by_scheduler_id().returning(|_, _| {
        Ok(Some(ReplenishmentEntity {
            executions: 2,
            times: Some(3),
            ..entity_with_status(ReplenishmentStatusEntity::Active)
        }))
    });
    deps.payment_gateway_service
        .expect_charge()
        .returning(|_, _, _| Ok(PaymentOutcome::Succeeded));
    deps.replenishment_payment_dao
        .expect_create()
        .returning(|_, _, _| Ok(()));
    deps.replenishment_dao
        .expect_update()
        .withf(|entity, _, _| {
            entity.executions == 3
                && entity.status == ReplenishmentStatusEntity::Finished
                && entity.next_payment_date.is_none()
                && entity.next_job_id.is_none()
        })
        .returning(|_, _, _| Ok(()));

    let service = deps.build_service();
    let outcome = service
        .execute_cycle(SCHEDULER_ID, Authentication::Full, None)
        .await
        .expect("Expected cycle outcome");
    assert_eq!(CycleOutcome::Finished, outcome);
}
