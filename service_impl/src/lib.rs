pub mod macros;

pub mod cache;
pub mod clock;
pub mod customer;
pub mod job_queue;
pub mod payment_gateway;
pub mod permission;
pub mod replenishment;
pub mod uuid_service;
pub mod worker;

#[cfg(test)]
mod test;
