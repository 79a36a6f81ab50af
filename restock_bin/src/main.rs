use std::sync::Arc;

use dao_impl_sqlite::{
    customer::CustomerDaoImpl, replenishment::ReplenishmentDaoImpl,
    replenishment_payment::ReplenishmentPaymentDaoImpl, TransactionDaoImpl, TransactionImpl,
};
use service::permission::MockContext;
use sqlx::SqlitePool;
#[cfg(feature = "json_logging")]
use tracing_subscriber::fmt::format::FmtSpan;

type Context = MockContext;
type Transaction = TransactionImpl;
type TransactionDao = TransactionDaoImpl;
type CustomerDao = CustomerDaoImpl;
type ReplenishmentDao = ReplenishmentDaoImpl;
type ReplenishmentPaymentDao = ReplenishmentPaymentDaoImpl;

type ClockService = service_impl::clock::ClockServiceImpl;
type UuidService = service_impl::uuid_service::UuidServiceImpl;
type PermissionService = service_impl::permission::PermissionServiceDev;
type PaymentGatewayService = service_impl::payment_gateway::PaymentGatewayDev;
type CacheService = service_impl::cache::RedisCacheService;

pub struct WorkerDependencies;
impl service_impl::worker::ReplenishmentWorkerDeps for WorkerDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type ReplenishmentDao = ReplenishmentDao;
    type ReplenishmentPaymentDao = ReplenishmentPaymentDao;
    type TransactionDao = TransactionDao;
    type PaymentGatewayService = PaymentGatewayService;
    type ClockService = ClockService;
    type UuidService = UuidService;
}
type WorkerService = service_impl::worker::ReplenishmentWorkerImpl<WorkerDependencies>;

pub struct JobQueueDependencies;
impl service_impl::job_queue::InProcessJobQueueDeps for JobQueueDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type WorkerService = WorkerService;
    type ClockService = ClockService;
    type UuidService = UuidService;
}
type JobQueueService = service_impl::job_queue::InProcessJobQueueImpl<JobQueueDependencies>;

pub struct ReplenishmentServiceDependencies;
impl service_impl::replenishment::ReplenishmentServiceDeps for ReplenishmentServiceDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type ReplenishmentDao = ReplenishmentDao;
    type ReplenishmentPaymentDao = ReplenishmentPaymentDao;
    type CustomerDao = CustomerDao;
    type TransactionDao = TransactionDao;
    type PermissionService = PermissionService;
    type ClockService = ClockService;
    type UuidService = UuidService;
    type JobQueueService = JobQueueService;
    type CacheService = CacheService;
}
type ReplenishmentService =
    service_impl::replenishment::ReplenishmentServiceImpl<ReplenishmentServiceDependencies>;

pub struct CustomerServiceDependencies;
impl service_impl::customer::CustomerServiceDeps for CustomerServiceDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type CustomerDao = CustomerDao;
    type TransactionDao = TransactionDao;
    type PermissionService = PermissionService;
    type UuidService = UuidService;
}
type CustomerService = service_impl::customer::CustomerServiceImpl<CustomerServiceDependencies>;

#[derive(Clone)]
pub struct RestStateImpl {
    customer_service: Arc<CustomerService>,
    replenishment_service: Arc<ReplenishmentService>,
}
impl rest::RestStateDef for RestStateImpl {
    type CustomerService = CustomerService;
    type ReplenishmentService = ReplenishmentService;

    fn customer_service(&self) -> Arc<Self::CustomerService> {
        self.customer_service.clone()
    }
    fn replenishment_service(&self) -> Arc<Self::ReplenishmentService> {
        self.replenishment_service.clone()
    }
}

impl RestStateImpl {
    pub fn new(
        pool: Arc<sqlx::Pool<sqlx::Sqlite>>,
        cache_connection: redis::aio::ConnectionManager,
    ) -> Self {
        let transaction_dao = Arc::new(TransactionDao::new(pool.clone()));
        let customer_dao = Arc::new(CustomerDao::new(pool.clone()));
        let replenishment_dao = Arc::new(ReplenishmentDao::new(pool.clone()));
        let replenishment_payment_dao = Arc::new(ReplenishmentPaymentDao::new(pool.clone()));

        let permission_service = Arc::new(service_impl::permission::PermissionServiceDev);
        let clock_service = Arc::new(service_impl::clock::ClockServiceImpl);
        let uuid_service = Arc::new(service_impl::uuid_service::UuidServiceImpl);
        let payment_gateway_service = Arc::new(service_impl::payment_gateway::PaymentGatewayDev);
        let cache_service = Arc::new(service_impl::cache::RedisCacheService::new(
            cache_connection,
        ));

        let worker_service = Arc::new(service_impl::worker::ReplenishmentWorkerImpl::<
            WorkerDependencies,
        > {
            replenishment_dao: replenishment_dao.clone(),
            replenishment_payment_dao: replenishment_payment_dao.clone(),
            transaction_dao: transaction_dao.clone(),
            payment_gateway_service,
            clock_service: clock_service.clone(),
            uuid_service: uuid_service.clone(),
        });
        let job_queue_service = Arc::new(service_impl::job_queue::InProcessJobQueueImpl::<
            JobQueueDependencies,
        > {
            worker_service,
            clock_service: clock_service.clone(),
            uuid_service: uuid_service.clone(),
            entries: Arc::default(),
        });
        let replenishment_service =
            Arc::new(service_impl::replenishment::ReplenishmentServiceImpl::<
                ReplenishmentServiceDependencies,
            > {
                replenishment_dao,
                replenishment_payment_dao,
                customer_dao: customer_dao.clone(),
                transaction_dao: transaction_dao.clone(),
                permission_service: permission_service.clone(),
                clock_service,
                uuid_service: uuid_service.clone(),
                job_queue_service,
                cache_service,
            });
        let customer_service = Arc::new(service_impl::customer::CustomerServiceImpl::<
            CustomerServiceDependencies,
        > {
            customer_dao,
            transaction_dao,
            permission_service,
            uuid_service,
        });

        Self {
            customer_service,
            replenishment_service,
        }
    }
}

async fn restore_schedulers<S: service::replenishment::ReplenishmentService>(service: &S) {
    let restored = service
        .restore_schedulers(service::permission::Authentication::Full, None)
        .await
        .expect("Expected scheduler restore to succeed");
    tracing::info!("Restored {} scheduler entries", restored);
}

#[tokio::main]
async fn main() {
    let version = env!("CARGO_PKG_VERSION");

    #[cfg(feature = "local_logging")]
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::TRACE)
        .pretty()
        .with_file(true)
        .finish();

    #[cfg(feature = "json_logging")]
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_span_list(true)
        .with_file(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    tracing::info!("Restock backend version: {}", version);
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./localdb.sqlite3".into());
    let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into());

    let pool = Arc::new(
        SqlitePool::connect(&database_url)
            .await
            .expect("Could not connect to database"),
    );
    sqlx::migrate!("../migrations/sqlite")
        .run(pool.as_ref())
        .await
        .expect("Failed to run migrations");

    let client = redis::Client::open(redis_url.as_str()).expect("Invalid redis url");
    let cache_connection = redis::aio::ConnectionManager::new(client)
        .await
        .expect("Could not connect to redis");

    let rest_state = RestStateImpl::new(pool, cache_connection);
    restore_schedulers(rest_state.replenishment_service.as_ref()).await;

    rest::start_server(rest_state, &bind_address).await
}
