//! Service entity - a grantable gym facility or activity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ServiceId, ValidationError};

/// A gym service that access can be granted to (pool, sauna, group classes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub description: Option<String>,
    /// Disabled services cannot receive new grants; existing grants keep
    /// their windows.
    pub enabled: bool,
    /// Standard session duration in minutes, if the service is session-based.
    pub standard_duration_min: Option<i32>,
    /// Maximum simultaneous attendance, if capped.
    pub max_capacity: Option<i32>,
}

impl Service {
    pub fn new(
        id: ServiceId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        Ok(Self {
            id,
            name,
            description,
            enabled: true,
            standard_duration_min: None,
            max_capacity: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_service_is_enabled() {
        let service = Service::new(ServiceId::new(), "Pool", None).unwrap();
        assert!(service.enabled);
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(Service::new(ServiceId::new(), "", None).is_err());
    }
}
