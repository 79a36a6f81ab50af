#[cfg(test)]
pub mod customer;
#[cfg(test)]
pub mod error_test;
#[cfg(test)]
pub mod job_queue;
#[cfg(test)]
pub mod worker;
