use std::fmt::Debug;

use async_trait::async_trait;
use mockall::automock;

use crate::permission::Authentication;
use crate::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The payment went through and the record advanced one cycle.
    Charged,
    /// The payment was declined. The attempt is recorded, the record is not
    /// advanced.
    PaymentFailed,
    /// The record reached its occurrence cap and is now terminal.
    Finished,
    /// No non-terminal record exists for the scheduler id. The caller should
    /// drain the scheduler entry.
    Skipped,
}

#[automock(type Context=(); type Transaction=dao::MockTransaction;)]
#[async_trait]
pub trait ReplenishmentWorkerService {
    type Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;
    type Transaction: dao::Transaction + Send + Sync + Clone + Debug + 'static;

    /// Executes one due cycle for the replenishment behind `scheduler_id`:
    /// charge, record the payment attempt and advance the record.
    async fn execute_cycle(
        &self,
        scheduler_id: &str,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<CycleOutcome, ServiceError>;
}
