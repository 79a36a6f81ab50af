use std::sync::Arc;

use crate::job_queue::{InProcessJobQueueDeps, InProcessJobQueueImpl};
use crate::test::error_test::generate_default_datetime;
use dao::MockTransaction;
use mockall::Sequence;
use service::clock::MockClockService;
use service::job_queue::{JobQueueService, JobTemplate, RepeatRule, ReplenishmentJobPayload};
use service::replenishment::OrderTemplate;
use service::uuid_service::MockUuidService;
use service::worker::{CycleOutcome, MockReplenishmentWorkerService};
use time::Duration;
use uuid::Uuid;

pub struct JobQueueDependencies;

impl InProcessJobQueueDeps for JobQueueDependencies {
    type Context = ();
    type Transaction = MockTransaction;

    type WorkerService = MockReplenishmentWorkerService;
    type ClockService = MockClockService;
    type UuidService = MockUuidService;
}

fn build_queue(
    worker: MockReplenishmentWorkerService,
) -> InProcessJobQueueImpl<JobQueueDependencies> {
    let mut clock_service = MockClockService::new();
    clock_service
        .expect_date_time_now()
        .returning(generate_default_datetime);
    let mut uuid_service = MockUuidService::new();
    uuid_service
        .expect_new_uuid()
        .returning(|_| Uuid::new_v4());
    InProcessJobQueueImpl {
        worker_service: Arc::new(worker),
        clock_service: Arc::new(clock_service),
        uuid_service: Arc::new(uuid_service),
        entries: Arc::default(),
    }
}

/// The start date lies far in the future, so the driving task sleeps and
/// never reaches the worker during the test.
fn dormant_rule() -> RepeatRule {
    RepeatRule {
        every_ms: 86_400_000,
        start_date: Some(generate_default_datetime() + Duration::days(365)),
        end_date: None,
        limit: None,
    }
}

fn cycle_template() -> JobTemplate {
    JobTemplate {
        name: "replenishment-cycle".into(),
        payload: ReplenishmentJobPayload {
            customer_id: Uuid::nil(),
            template: OrderTemplate {
                lines: [].into(),
                payment_method: "pm-card".into(),
                shipping_country: "DE".into(),
            },
            start_date: generate_default_datetime() + Duration::days(365),
            end_date: None,
            period_ms: 86_400_000,
        },
    }
}

#[tokio::test]
async fn test_upsert_registers_entry_and_returns_handle() {
    let queue = build_queue(MockReplenishmentWorkerService::new());
    let handle = queue
        .upsert_job_scheduler("sched-1", &dormant_rule(), &cycle_template())
        .await
        .expect("Expected upsert to succeed");
    let handle = handle.expect("Expected a job handle");
    assert!(handle.job_id.starts_with("replenishment-cycle-"));
    assert!(queue.entries.lock().await.contains_key("sched-1"));
}

#[tokio::test]
async fn test_upsert_replaces_existing_entry() {
    let queue = build_queue(MockReplenishmentWorkerService::new());
    let first = queue
        .upsert_job_scheduler("sched-1", &dormant_rule(), &cycle_template())
        .await
        .expect("Expected upsert to succeed")
        .expect("Expected a job handle");
    let second = queue
        .upsert_job_scheduler("sched-1", &dormant_rule(), &cycle_template())
        .await
        .expect("Expected upsert to succeed")
        .expect("Expected a job handle");
    assert_ne!(first.job_id, second.job_id);
    assert_eq!(1, queue.entries.lock().await.len());
}

fn immediate_rule(limit: Option<u32>) -> RepeatRule {
    RepeatRule {
        every_ms: 60_000,
        start_date: Some(generate_default_datetime()),
        end_date: None,
        limit,
    }
}

#[tokio::test(start_paused = true)]
async fn test_declined_cycles_do_not_consume_the_occurrence_limit() {
    let mut worker = MockReplenishmentWorkerService::new();
    let mut seq = Sequence::new();
    worker
        .expect_execute_cycle()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(CycleOutcome::PaymentFailed));
    worker
        .expect_execute_cycle()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(CycleOutcome::Charged));

    let queue = build_queue(worker);
    queue
        .upsert_job_scheduler("sched-1", &immediate_rule(Some(1)), &cycle_template())
        .await
        .expect("Expected upsert to succeed");

    // A declined first tick must leave the limit untouched, so the entry
    // only drains after the following charged tick.
    tokio::time::sleep(std::time::Duration::from_secs(300)).await;
    assert!(queue.entries.lock().await.is_empty());
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let queue = build_queue(MockReplenishmentWorkerService::new());
    queue
        .upsert_job_scheduler("sched-1", &dormant_rule(), &cycle_template())
        .await
        .expect("Expected upsert to succeed");
    queue
        .remove_job_scheduler("sched-1")
        .await
        .expect("Expected removal to succeed");
    queue
        .remove_job_scheduler("sched-1")
        .await
        .expect("Expected second removal to succeed");
    assert!(queue.entries.lock().await.is_empty());
}
