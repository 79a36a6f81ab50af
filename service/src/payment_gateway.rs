use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    Declined,
}

/// Charges a stored payment method. Invoked by the cycle worker, never by
/// the scheduling API itself.
#[automock]
#[async_trait]
pub trait PaymentGatewayService {
    async fn charge(
        &self,
        customer_id: Uuid,
        payment_method: &str,
        amount_cents: u64,
    ) -> Result<PaymentOutcome, ServiceError>;
}
