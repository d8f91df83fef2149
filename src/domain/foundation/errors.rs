//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be positive, got {actual}")]
    NotPositive { field: String, actual: i64 },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates a not-positive validation error.
    pub fn not_positive(field: impl Into<String>, actual: i64) -> Self {
        ValidationError::NotPositive {
            field: field.into(),
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidWindow,

    // Not found errors
    ClientNotFound,
    ServiceNotFound,
    TypeNotFound,
    TierNotFound,
    SubscriptionNotFound,
    GrantNotFound,

    // State errors
    ServiceDisabled,
    SubscriptionNotActive,
    SubscriptionMismatch,
    InvalidStateTransition,

    // Conflict errors
    DuplicateGrant,
    HasDependents,

    // Infrastructure errors
    DatabaseError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidWindow => "INVALID_WINDOW",
            ErrorCode::ClientNotFound => "CLIENT_NOT_FOUND",
            ErrorCode::ServiceNotFound => "SERVICE_NOT_FOUND",
            ErrorCode::TypeNotFound => "TYPE_NOT_FOUND",
            ErrorCode::TierNotFound => "TIER_NOT_FOUND",
            ErrorCode::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            ErrorCode::GrantNotFound => "GRANT_NOT_FOUND",
            ErrorCode::ServiceDisabled => "SERVICE_DISABLED",
            ErrorCode::SubscriptionNotActive => "SUBSCRIPTION_NOT_ACTIVE",
            ErrorCode::SubscriptionMismatch => "SUBSCRIPTION_MISMATCH",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::DuplicateGrant => "DUPLICATE_GRANT",
            ErrorCode::HasDependents => "HAS_DEPENDENTS",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

impl ErrorCode {
    /// Returns true for codes that mean a referenced entity is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ErrorCode::ClientNotFound
                | ErrorCode::ServiceNotFound
                | ErrorCode::TypeNotFound
                | ErrorCode::TierNotFound
                | ErrorCode::SubscriptionNotFound
                | ErrorCode::GrantNotFound
        )
    }

    /// Returns true for codes that represent a conflict with existing state.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ErrorCode::DuplicateGrant | ErrorCode::HasDependents)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            details: HashMap::new(),
        }
        .with_detail("field", field.into())
    }

    /// Creates an invalid-window error.
    pub fn invalid_window(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidWindow, message)
    }

    /// Creates a not-found error for the given entity code.
    pub fn not_found(code: ErrorCode, entity: &str, id: impl fmt::Display) -> Self {
        Self::new(code, format!("{} with id {} not found", entity, id))
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::new(ErrorCode::ValidationFailed, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("name");
        assert_eq!(format!("{}", err), "Field 'name' cannot be empty");
    }

    #[test]
    fn validation_error_not_positive_displays_correctly() {
        let err = ValidationError::not_positive("duration_days", -3);
        assert_eq!(
            format!("{}", err),
            "Field 'duration_days' must be positive, got -3"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found");
        assert_eq!(
            format!("{}", err),
            "[SUBSCRIPTION_NOT_FOUND] Subscription not found"
        );
    }

    #[test]
    fn domain_error_with_detail_adds_detail() {
        let err = DomainError::new(ErrorCode::ValidationFailed, "Validation failed")
            .with_detail("field", "valid_from");

        assert_eq!(err.details.get("field"), Some(&"valid_from".to_string()));
    }

    #[test]
    fn not_found_codes_are_classified() {
        assert!(ErrorCode::ClientNotFound.is_not_found());
        assert!(ErrorCode::GrantNotFound.is_not_found());
        assert!(!ErrorCode::InvalidWindow.is_not_found());
    }

    #[test]
    fn conflict_codes_are_classified() {
        assert!(ErrorCode::HasDependents.is_conflict());
        assert!(ErrorCode::DuplicateGrant.is_conflict());
        assert!(!ErrorCode::DatabaseError.is_conflict());
    }

    #[test]
    fn validation_error_converts_to_domain_error() {
        let err: DomainError = ValidationError::empty_field("name").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
