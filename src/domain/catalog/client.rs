//! Client entity - a registered gym member.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClientId, Timestamp, ValidationError};

/// A registered gym client.
///
/// Clients are created by registration and referenced by subscriptions and
/// access grants. A client owning a subscription whose window has not closed
/// is never deleted (referential guard enforced at the storage boundary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    /// Administrative flag; disabled clients keep their history but cannot
    /// purchase new subscriptions.
    pub enabled: bool,
    pub registered_at: Timestamp,
}

impl Client {
    /// Creates a new enabled client.
    pub fn new(
        id: ClientId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: impl Into<String>,
        email: Option<String>,
        registered_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        if first_name.trim().is_empty() {
            return Err(ValidationError::empty_field("first_name"));
        }
        if last_name.trim().is_empty() {
            return Err(ValidationError::empty_field("last_name"));
        }
        Ok(Self {
            id,
            first_name,
            last_name,
            phone: phone.into(),
            email,
            enabled: true,
            registered_at,
        })
    }

    /// Full display name, "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
