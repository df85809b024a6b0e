//! Infrastructure layer - store clients and service implementations

pub mod api_key;
pub mod cache;
pub mod logging;
pub mod usage;
