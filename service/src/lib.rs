use std::fmt::Display;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

pub mod cache;
pub mod clock;
pub mod customer;
pub mod job_queue;
pub mod payment_gateway;
pub mod permission;
pub mod replenishment;
pub mod uuid_service;
pub mod worker;

pub use permission::{Authentication, MockPermissionService, PermissionService};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationFailureItem {
    InvalidValue(Arc<str>),
    Empty(Arc<str>),
    ModificationNotAllowed(Arc<str>),
}
impl Display for ValidationFailureItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue(field) => write!(f, "Invalid value for {field}"),
            Self::Empty(field) => write!(f, "{field} must not be empty"),
            Self::ModificationNotAllowed(field) => {
                write!(f, "Modification of {field} is not allowed")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database query error: {0}")]
    DatabaseQueryError(#[from] dao::DaoError),

    #[error("Cache store error: {0}")]
    CacheStoreError(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Forbidden")]
    Forbidden,

    #[error("Customer {0} not found")]
    CustomerNotFound(Uuid),

    #[error("Replenishment {0} not found")]
    ReplenishmentNotFound(Uuid),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(replenishment::TransitionRejection),

    #[error("Job scheduler upsert returned no handle for {0}")]
    SchedulingFailure(Arc<str>),

    #[error("Validation error: {0:?}")]
    ValidationError(Arc<[ValidationFailureItem]>),

    #[error("Id must not be set on create")]
    IdSetOnCreate,
}
