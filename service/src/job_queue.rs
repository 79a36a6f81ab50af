use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::replenishment::OrderTemplate;
use crate::ServiceError;

/// Repeat rule of a job-scheduler entry: fixed-interval repetition with an
/// optional window and occurrence cap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatRule {
    pub every_ms: u64,
    pub start_date: Option<PrimitiveDateTime>,
    pub end_date: Option<PrimitiveDateTime>,
    pub limit: Option<u32>,
}

/// Payload carried by every scheduled cycle job. Fully typed and validated at
/// construction, shared between the scheduler and the worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishmentJobPayload {
    pub customer_id: Uuid,
    pub template: OrderTemplate,
    pub start_date: PrimitiveDateTime,
    pub end_date: Option<PrimitiveDateTime>,
    pub period_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTemplate {
    pub name: Arc<str>,
    pub payload: ReplenishmentJobPayload,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: Arc<str>,
}

/// Seam to the external delayed/recurring job queue. The queue delivers
/// at-least-once; retry and backoff of executed jobs live behind this trait,
/// not in the callers.
#[automock]
#[async_trait]
pub trait JobQueueService {
    /// Registers or replaces the recurring job descriptor for
    /// `scheduler_id`. Returns `None` when the queue could not produce a job
    /// handle, which callers must treat as a hard scheduling failure.
    async fn upsert_job_scheduler(
        &self,
        scheduler_id: &str,
        repeat: &RepeatRule,
        template: &JobTemplate,
    ) -> Result<Option<JobHandle>, ServiceError>;

    /// Removes the entry for `scheduler_id`. Removing an absent entry is not
    /// an error.
    async fn remove_job_scheduler(&self, scheduler_id: &str) -> Result<(), ServiceError>;
}
