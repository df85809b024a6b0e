//! Counter store abstraction for the rate limiter

mod repository;

pub use repository::Cache;

#[cfg(test)]
pub use repository::mock::MockCache;
