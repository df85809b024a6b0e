//! API key infrastructure: token generation, password hashing, lifecycle
//! management, and request admission.

mod admission;
mod generator;
mod manager;
mod password;
mod rate_limiter;
mod repository;
mod storage_repository;

pub use admission::{AdmissionController, AdmittedKey};
pub use generator::ApiKeyGenerator;
pub use manager::{IssueOutcome, KeyManager, RotationOutcome};
pub use password::{Argon2Hasher, PasswordHasher};
pub use rate_limiter::{FixedWindowLimiter, RateLimitConfig, RateLimitResult};
pub use repository::InMemoryCredentialRepository;
pub use storage_repository::PostgresCredentialRepository;
