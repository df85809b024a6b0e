//! Owner identity and token format validation

use thiserror::Error;

use super::TOKEN_HEX_LEN;

/// Errors raised when validating an owner identity
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OwnerValidationError {
    #[error("owner identity cannot be empty")]
    Empty,

    #[error("owner identity exceeds maximum length of {0} characters")]
    TooLong(usize),

    #[error("owner identity contains invalid character: '{0}'")]
    InvalidCharacter(char),
}

const MAX_OWNER_LENGTH: usize = 254;

/// Validate an owner identity.
///
/// The identity is treated as an opaque string; the only rules are
/// non-emptiness, a length cap, and no whitespace or control characters.
pub fn validate_owner_identity(owner: &str) -> Result<(), OwnerValidationError> {
    if owner.is_empty() {
        return Err(OwnerValidationError::Empty);
    }

    if owner.len() > MAX_OWNER_LENGTH {
        return Err(OwnerValidationError::TooLong(MAX_OWNER_LENGTH));
    }

    for c in owner.chars() {
        if c.is_whitespace() || c.is_control() {
            return Err(OwnerValidationError::InvalidCharacter(c));
        }
    }

    Ok(())
}

/// Cheap shape check for a presented token: exactly 64 lowercase hex
/// characters. Anything else cannot possibly match a stored key, so the
/// admission path rejects it without a store round-trip.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_HEX_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_owner_identities() {
        assert!(validate_owner_identity("alice@example.com").is_ok());
        assert!(validate_owner_identity("bob").is_ok());
        assert!(validate_owner_identity("user+tag@host.io").is_ok());
    }

    #[test]
    fn test_empty_owner() {
        assert_eq!(validate_owner_identity(""), Err(OwnerValidationError::Empty));
    }

    #[test]
    fn test_owner_too_long() {
        let long = "a".repeat(255);
        assert_eq!(
            validate_owner_identity(&long),
            Err(OwnerValidationError::TooLong(254))
        );
    }

    #[test]
    fn test_owner_with_whitespace() {
        assert_eq!(
            validate_owner_identity("alice smith"),
            Err(OwnerValidationError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn test_well_formed_token() {
        assert!(is_well_formed_token(&"ab".repeat(32)));
        assert!(is_well_formed_token(&"09".repeat(32)));
    }

    #[test]
    fn test_malformed_tokens() {
        // Too short
        assert!(!is_well_formed_token("abc123"));
        // Uppercase hex
        assert!(!is_well_formed_token(&"AB".repeat(32)));
        // Non-hex character
        assert!(!is_well_formed_token(&"zz".repeat(32)));
        // Empty
        assert!(!is_well_formed_token(""));
    }
}
