use service::permission::Authentication;
use service::replenishment::TransitionRejection;
use service::ValidationFailureItem;
use time::{Date, Month, PrimitiveDateTime, Time};
use uuid::Uuid;

pub fn test_customer_not_found<T>(result: &Result<T, service::ServiceError>, target_id: &Uuid) {
    if let Err(service::ServiceError::CustomerNotFound(id)) = result {
        assert_eq!(
            id, target_id,
            "Expected customer {} not found but got {}",
            target_id, id
        );
    } else {
        panic!("Expected customer {} not found error", target_id);
    }
}

pub fn test_replenishment_not_found<T>(
    result: &Result<T, service::ServiceError>,
    target_id: &Uuid,
) {
    if let Err(service::ServiceError::ReplenishmentNotFound(id)) = result {
        assert_eq!(
            id, target_id,
            "Expected replenishment {} not found but got {}",
            target_id, id
        );
    } else {
        panic!("Expected replenishment {} not found error", target_id);
    }
}

pub fn test_invalid_transition<T>(
    result: &Result<T, service::ServiceError>,
    rejection: TransitionRejection,
) {
    if let Err(service::ServiceError::InvalidStateTransition(actual)) = result {
        assert_eq!(&rejection, actual, "Unexpected transition rejection");
    } else {
        panic!("Expected invalid state transition error");
    }
}

pub fn test_scheduling_failure<T>(result: &Result<T, service::ServiceError>, scheduler_id: &str) {
    if let Err(service::ServiceError::SchedulingFailure(id)) = result {
        assert_eq!(scheduler_id, id.as_ref());
    } else {
        panic!("Expected scheduling failure error");
    }
}

pub fn test_zero_id_error<T>(result: &Result<T, service::ServiceError>) {
    if let Err(service::ServiceError::IdSetOnCreate) = result {
    } else {
        panic!("Expected id set on create error");
    }
}

pub fn test_validation_error<T>(
    result: &Result<T, service::ServiceError>,
    validation_failure: &ValidationFailureItem,
    fail_count: usize,
) {
    if let Err(service::ServiceError::ValidationError(validation_failure_items)) = result {
        if !validation_failure_items.contains(validation_failure) {
            panic!(
                "Validation failure not found: {:?} in {:?}",
                validation_failure, validation_failure_items
            );
        }
        assert_eq!(fail_count, validation_failure_items.len());
    } else {
        panic!("Expected validation error");
    }
}

pub fn generate_default_datetime() -> PrimitiveDateTime {
    PrimitiveDateTime::new(
        Date::from_calendar_date(2026, Month::April, 5).unwrap(),
        Time::from_hms(23, 42, 0).unwrap(),
    )
}

pub trait NoneTypeExt {
    fn auth(&self) -> Authentication<()>;
}
impl NoneTypeExt for () {
    fn auth(&self) -> Authentication<()> {
        Authentication::Context(())
    }
}
