use std::sync::Arc;

use crate::customer::{CustomerServiceDeps, CustomerServiceImpl};
use crate::test::error_test::{
    test_customer_not_found, test_validation_error, test_zero_id_error, NoneTypeExt,
};
use dao::customer::{CustomerEntity, MockCustomerDao};
use dao::{MockTransaction, MockTransactionDao};
use mockall::predicate::{always, eq};
use service::customer::{Customer, CustomerService};
use service::uuid_service::MockUuidService;
use service::{MockPermissionService, ValidationFailureItem};
use uuid::{uuid, Uuid};

fn default_customer_id() -> Uuid {
    uuid!("b7e5b70e-3f02-47ae-b600-20bc80c0f354")
}

fn default_version() -> Uuid {
    uuid!("f79c462a-8d4e-42e1-8171-db4dbd019e50")
}

fn default_customer_entity() -> CustomerEntity {
    CustomerEntity {
        id: default_customer_id(),
        name: "Jane Doe".into(),
        email: "jane@example.com".into(),
        country: "DE".into(),
        deleted: None,
        version: default_version(),
    }
}

fn new_customer() -> Customer {
    Customer {
        id: Uuid::nil(),
        name: "Jane Doe".into(),
        email: "jane@example.com".into(),
        country: "DE".into(),
        deleted: None,
        version: Uuid::nil(),
    }
}

pub struct CustomerServiceDependencies {
    pub customer_dao: MockCustomerDao,
}

impl CustomerServiceDeps for CustomerServiceDependencies {
    type Context = ();
    type Transaction = MockTransaction;

    type CustomerDao = MockCustomerDao;
    type TransactionDao = MockTransactionDao;
    type PermissionService = MockPermissionService;
    type UuidService = MockUuidService;
}

impl CustomerServiceDependencies {
    pub fn build_service(self) -> CustomerServiceImpl<CustomerServiceDependencies> {
        let mut transaction_dao = MockTransactionDao::new();
        transaction_dao
            .expect_use_transaction()
            .returning(|_| Ok(MockTransaction));
        transaction_dao.expect_commit().returning(|_| Ok(()));
        let mut permission_service = MockPermissionService::new();
        permission_service
            .expect_check_permission()
            .returning(|_, _| Ok(()));
        let mut uuid_service = MockUuidService::new();
        uuid_service
            .expect_new_uuid()
            .returning(|_| default_version());

        CustomerServiceImpl {
            customer_dao: self.customer_dao.into(),
            transaction_dao: Arc::new(transaction_dao),
            permission_service: Arc::new(permission_service),
            uuid_service: Arc::new(uuid_service),
        }
    }
}

fn build_dependencies() -> CustomerServiceDependencies {
    CustomerServiceDependencies {
        customer_dao: MockCustomerDao::new(),
    }
}

#[tokio::test]
async fn test_get_all_customers() {
    let mut deps = build_dependencies();
    deps.customer_dao
        .expect_all()
        .returning(|_| Ok([default_customer_entity()].into()));

    let service = deps.build_service();
    let customers = service
        .get_all(().auth(), None)
        .await
        .expect("Expected customers");
    assert_eq!(1, customers.len());
    assert_eq!(default_customer_id(), customers[0].id);
}

#[tokio::test]
async fn test_get_customer_not_found() {
    let mut deps = build_dependencies();
    deps.customer_dao
        .expect_find_by_id()
        .with(eq(default_customer_id()), always())
        .returning(|_, _| Ok(None));

    let service = deps.build_service();
    let result = service.get(default_customer_id(), ().auth(), None).await;
    test_customer_not_found(&result, &default_customer_id());
}

#[tokio::test]
async fn test_exists_ignores_deleted_customer() {
    let mut deps = build_dependencies();
    deps.customer_dao.expect_find_by_id().returning(|_, _| {
        Ok(Some(CustomerEntity {
            deleted: Some(crate::test::error_test::generate_default_datetime()),
            ..default_customer_entity()
        }))
    });

    let service = deps.build_service();
    let exists = service
        .exists(default_customer_id(), ().auth(), None)
        .await
        .expect("Expected exists result");
    assert!(!exists);
}

#[tokio::test]
async fn test_create_customer() {
    let mut deps = build_dependencies();
    deps.customer_dao
        .expect_create()
        .withf(|entity, process, _tx| {
            entity.id == default_version() && process == "customer-service"
        })
        .returning(|_, _, _| Ok(()));

    let service = deps.build_service();
    let customer = service
        .create(&new_customer(), ().auth(), None)
        .await
        .expect("Expected created customer");
    assert!(!customer.id.is_nil());
}

#[tokio::test]
async fn test_create_customer_with_id_rejected() {
    let deps = build_dependencies();
    let service = deps.build_service();
    let customer = Customer {
        id: default_customer_id(),
        ..new_customer()
    };
    let result = service.create(&customer, ().auth(), None).await;
    test_zero_id_error(&result);
}

#[tokio::test]
async fn test_create_customer_validation() {
    let deps = build_dependencies();
    let service = deps.build_service();
    let customer = Customer {
        name: "".into(),
        email: "".into(),
        ..new_customer()
    };
    let result = service.create(&customer, ().auth(), None).await;
    test_validation_error(&result, &ValidationFailureItem::Empty("name".into()), 2);
}
