//! API middleware components

pub mod auth;

pub use auth::{admission_gate, API_KEY_HEADER};
