//! API key credential entity and repository trait

mod entity;
mod repository;
mod validation;

pub use entity::{ApiKeyRecord, Profile};
pub use repository::CredentialRepository;
pub use validation::{is_well_formed_token, validate_owner_identity, OwnerValidationError};

/// Number of random bytes in a generated API key token
pub const TOKEN_BYTES: usize = 32;

/// Length of a hex-encoded API key token
pub const TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;
