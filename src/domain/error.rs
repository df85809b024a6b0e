use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Whether the error indicates a backing store is unreachable
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Cache { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Owner 'alice@example.com' has no active key");
        assert_eq!(
            error.to_string(),
            "Not found: Owner 'alice@example.com' has no active key"
        );
    }

    #[test]
    fn test_unauthorized_error() {
        let error = DomainError::unauthorized("Invalid email or password");
        assert_eq!(error.to_string(), "Unauthorized: Invalid email or password");
    }

    #[test]
    fn test_rate_limited_error() {
        let error = DomainError::rate_limited(42);
        assert_eq!(error.to_string(), "Rate limit exceeded, retry in 42s");
    }

    #[test]
    fn test_backend_unavailable() {
        assert!(DomainError::storage("down").is_backend_unavailable());
        assert!(DomainError::cache("down").is_backend_unavailable());
        assert!(!DomainError::conflict("dup").is_backend_unavailable());
    }
}
