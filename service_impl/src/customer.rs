use std::sync::Arc;

use crate::gen_service_impl;
use async_trait::async_trait;
use dao::{customer::CustomerDao, TransactionDao};
use service::{
    customer::{Customer, CustomerService},
    permission::{Authentication, ADMIN_PRIVILEGE, SHOP_PRIVILEGE},
    uuid_service::UuidService,
    PermissionService, ServiceError, ValidationFailureItem,
};
use uuid::Uuid;

pub const CUSTOMER_SERVICE_PROCESS: &str = "customer-service";

gen_service_impl! {
    struct CustomerServiceImpl: service::customer::CustomerService = CustomerServiceDeps {
        CustomerDao: dao::customer::CustomerDao<Transaction = Self::Transaction> = customer_dao,
        TransactionDao: dao::TransactionDao<Transaction = Self::Transaction> = transaction_dao,
        PermissionService: service::PermissionService<Context = Self::Context> = permission_service,
        UuidService: service::uuid_service::UuidService = uuid_service
    }
}

#[async_trait]
impl<Deps: CustomerServiceDeps> CustomerService for CustomerServiceImpl<Deps> {
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn get_all(
        &self,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Customer]>, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let customers = self
            .customer_dao
            .all(tx.clone())
            .await?
            .iter()
            .map(Customer::from)
            .collect();
        self.transaction_dao.commit(tx).await?;
        Ok(customers)
    }

    async fn get(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Customer, ServiceError> {
        self.permission_service
            .check_permission(SHOP_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let customer = self
            .customer_dao
            .find_by_id(id, tx.clone())
            .await?
            .filter(|customer| customer.deleted.is_none())
            .map(|customer| Customer::from(&customer))
            .ok_or(ServiceError::CustomerNotFound(id))?;
        self.transaction_dao.commit(tx).await?;
        Ok(customer)
    }

    async fn exists(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<bool, ServiceError> {
        self.permission_service
            .check_permission(SHOP_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let exists = self
            .customer_dao
            .find_by_id(id, tx.clone())
            .await?
            .is_some_and(|customer| customer.deleted.is_none());
        self.transaction_dao.commit(tx).await?;
        Ok(exists)
    }

    async fn create(
        &self,
        customer: &Customer,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Customer, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;
        if !customer.id.is_nil() {
            return Err(ServiceError::IdSetOnCreate);
        }
        let mut failures: Vec<ValidationFailureItem> = Vec::new();
        if customer.name.is_empty() {
            failures.push(ValidationFailureItem::Empty("name".into()));
        }
        if customer.email.is_empty() {
            failures.push(ValidationFailureItem::Empty("email".into()));
        }
        if customer.country.is_empty() {
            failures.push(ValidationFailureItem::Empty("country".into()));
        }
        if !failures.is_empty() {
            return Err(ServiceError::ValidationError(failures.into()));
        }

        let tx = self.transaction_dao.use_transaction(tx).await?;
        let customer = Customer {
            id: self.uuid_service.new_uuid("customer-id"),
            version: self.uuid_service.new_uuid("customer-version"),
            ..customer.clone()
        };
        self.customer_dao
            .create(&(&customer).into(), CUSTOMER_SERVICE_PROCESS, tx.clone())
            .await?;
        self.transaction_dao.commit(tx).await?;
        Ok(customer)
    }
}
