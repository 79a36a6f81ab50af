use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::permission::Authentication;
use crate::ServiceError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Customer {
    pub id: Uuid,
    pub name: Arc<str>,
    pub email: Arc<str>,
    pub country: Arc<str>,
    pub deleted: Option<time::PrimitiveDateTime>,
    pub version: Uuid,
}
impl From<&dao::customer::CustomerEntity> for Customer {
    fn from(customer: &dao::customer::CustomerEntity) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            email: customer.email.clone(),
            country: customer.country.clone(),
            deleted: customer.deleted,
            version: customer.version,
        }
    }
}
impl From<&Customer> for dao::customer::CustomerEntity {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            email: customer.email.clone(),
            country: customer.country.clone(),
            deleted: customer.deleted,
            version: customer.version,
        }
    }
}

#[automock(type Context=(); type Transaction=dao::MockTransaction;)]
#[async_trait]
pub trait CustomerService {
    type Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;
    type Transaction: dao::Transaction + Send + Sync + Clone + Debug + 'static;

    async fn get_all(
        &self,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Customer]>, ServiceError>;
    async fn get(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Customer, ServiceError>;
    async fn exists(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<bool, ServiceError>;
    async fn create(
        &self,
        customer: &Customer,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Customer, ServiceError>;
}
