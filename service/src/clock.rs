use mockall::automock;

/// Time source for scheduling decisions. Injected so tests can pin the clock.
#[automock]
pub trait ClockService {
    fn date_time_now(&self) -> time::PrimitiveDateTime;
}
