use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::gen_service_impl;
use async_trait::async_trait;
use service::{
    clock::ClockService,
    job_queue::{JobHandle, JobQueueService, JobTemplate, RepeatRule},
    permission::Authentication,
    uuid_service::UuidService,
    worker::{CycleOutcome, ReplenishmentWorkerService},
    ServiceError,
};
use time::PrimitiveDateTime;
use tokio::sync::Mutex;
use tracing::{error, info};

/// A registered scheduler entry and the task driving it.
pub struct JobEntry {
    pub job_id: Arc<str>,
    task: tokio::task::JoinHandle<()>,
}

pub type JobEntries = Arc<Mutex<HashMap<Arc<str>, JobEntry>>>;

gen_service_impl! {
    struct InProcessJobQueueImpl: service::job_queue::JobQueueService = InProcessJobQueueDeps {
        WorkerService: service::worker::ReplenishmentWorkerService<Context = Self::Context, Transaction = Self::Transaction> = worker_service,
        ClockService: service::clock::ClockService = clock_service,
        UuidService: service::uuid_service::UuidService = uuid_service
    }
    extra {
        entries: JobEntries
    }
}

fn delay_until(start_date: Option<PrimitiveDateTime>, now: PrimitiveDateTime) -> Duration {
    match start_date {
        Some(start) if start > now => (start - now).try_into().unwrap_or(Duration::ZERO),
        _ => Duration::ZERO,
    }
}

#[async_trait]
impl<Deps: InProcessJobQueueDeps> JobQueueService for InProcessJobQueueImpl<Deps> {
    async fn upsert_job_scheduler(
        &self,
        scheduler_id: &str,
        repeat: &RepeatRule,
        template: &JobTemplate,
    ) -> Result<Option<JobHandle>, ServiceError> {
        let mut entries = self.entries.lock().await;
        if let Some(previous) = entries.remove(scheduler_id) {
            previous.task.abort();
        }

        let key: Arc<str> = scheduler_id.into();
        let job_id: Arc<str> = format!(
            "{}-{}",
            template.name,
            self.uuid_service.new_uuid("job-id")
        )
        .into();
        let initial_delay = delay_until(repeat.start_date, self.clock_service.date_time_now());
        let every = Duration::from_millis(repeat.every_ms);
        let end_date = repeat.end_date;
        let limit = repeat.limit;

        let worker = self.worker_service.clone();
        let clock = self.clock_service.clone();
        let entries_handle = self.entries.clone();
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(initial_delay).await;
            let mut remaining = limit;
            loop {
                if end_date.is_some_and(|end| clock.date_time_now() > end) {
                    break;
                }
                if remaining == Some(0) {
                    break;
                }
                match worker
                    .execute_cycle(task_key.as_ref(), Authentication::Full, None)
                    .await
                {
                    Ok(CycleOutcome::Finished | CycleOutcome::Skipped) => break,
                    // Only charged cycles count towards the occurrence limit.
                    // Declined or failed cycles are retried on the next tick.
                    Ok(CycleOutcome::Charged) => {
                        if let Some(remaining) = remaining.as_mut() {
                            *remaining -= 1;
                        }
                    }
                    Ok(CycleOutcome::PaymentFailed) => {}
                    Err(err) => {
                        error!("Cycle for scheduler {} failed: {}", task_key, err);
                    }
                }
                tokio::time::sleep(every).await;
            }
            entries_handle.lock().await.remove(task_key.as_ref());
            info!("Scheduler entry {} drained", task_key);
        });

        entries.insert(
            key,
            JobEntry {
                job_id: job_id.clone(),
                task,
            },
        );
        Ok(Some(JobHandle { job_id }))
    }

    async fn remove_job_scheduler(&self, scheduler_id: &str) -> Result<(), ServiceError> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.remove(scheduler_id) {
            entry.task.abort();
            info!("Removed scheduler entry {}", scheduler_id);
        }
        Ok(())
    }
}
