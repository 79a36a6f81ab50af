use async_trait::async_trait;
use service::payment_gateway::{PaymentGatewayService, PaymentOutcome};
use service::ServiceError;
use tracing::info;
use uuid::Uuid;

/// Accepts every charge. Used by the development setup where no real payment
/// provider is wired in.
pub struct PaymentGatewayDev;

#[async_trait]
impl PaymentGatewayService for PaymentGatewayDev {
    async fn charge(
        &self,
        customer_id: Uuid,
        payment_method: &str,
        amount_cents: u64,
    ) -> Result<PaymentOutcome, ServiceError> {
        info!(
            "Dev gateway charge of {} cents for customer {} via {}",
            amount_cents, customer_id, payment_method
        );
        Ok(PaymentOutcome::Succeeded)
    }
}
