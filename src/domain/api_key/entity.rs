//! API key credential record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque profile metadata attached to a key at issuance.
///
/// No validation beyond presence; the gateway never interprets these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl Profile {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: phone.into(),
        }
    }
}

/// One issued API key credential.
///
/// The token is globally unique across all records, active or not. For a
/// given owner at most one record is active at any instant; rotation flips
/// the old record inactive before inserting its replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    /// Owner identity (an email address on the HTTP surface)
    owner: String,
    /// The key token: 64 lowercase hex characters
    api_key: String,
    /// Argon2 PHC string for the owner's recovery password.
    /// Stored, never exposed in API responses.
    password_hash: String,
    /// Whether the key currently admits requests
    active: bool,
    /// Issuance timestamp
    created_at: DateTime<Utc>,
    /// Set when the record is disabled or rotated away
    #[serde(skip_serializing_if = "Option::is_none")]
    deactivated_at: Option<DateTime<Utc>>,
    /// Opaque owner metadata
    #[serde(default)]
    profile: Profile,
}

impl ApiKeyRecord {
    /// Create a new active record
    pub fn new(
        owner: impl Into<String>,
        api_key: impl Into<String>,
        password_hash: impl Into<String>,
        profile: Profile,
    ) -> Self {
        Self {
            owner: owner.into(),
            api_key: api_key.into(),
            password_hash: password_hash.into(),
            active: true,
            created_at: Utc::now(),
            deactivated_at: None,
            profile,
        }
    }

    /// Rebuild a record from its stored columns
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        owner: String,
        api_key: String,
        password_hash: String,
        active: bool,
        created_at: DateTime<Utc>,
        deactivated_at: Option<DateTime<Utc>>,
        profile: Profile,
    ) -> Self {
        Self {
            owner,
            api_key,
            password_hash,
            active,
            created_at,
            deactivated_at,
            profile,
        }
    }

    // Getters

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn deactivated_at(&self) -> Option<DateTime<Utc>> {
        self.deactivated_at
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    // Mutators

    /// Take the key out of service, stamping the deactivation time
    pub fn deactivate(&mut self) {
        self.active = false;
        self.deactivated_at = Some(Utc::now());
    }

    /// Put a disabled key back into service
    pub fn reactivate(&mut self) {
        self.active = true;
        self.deactivated_at = None;
    }

    /// Build the replacement record for a rotation: a fresh token carrying
    /// forward the owner's password hash and profile.
    pub fn successor(&self, new_token: impl Into<String>) -> Self {
        Self::new(
            self.owner.clone(),
            new_token,
            self.password_hash.clone(),
            self.profile.clone(),
        )
    }
}
