//! HTTP DTOs (Data Transfer Objects) for the gymdesk API.
//!
//! These types define the JSON request/response structure and serve as the
//! boundary between HTTP and the application layer. Timestamps cross the
//! wire as RFC 3339 strings; identifiers as UUID strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::AccessGrant;
use crate::domain::catalog::{Client, Service};
use crate::domain::subscription::{Subscription, SubscriptionStatus};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to purchase a subscription for a client.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub client_id: Uuid,
    pub type_id: Uuid,
    pub tier_id: Uuid,
    /// Start of validity; defaults to now.
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    /// Amount actually paid; defaults to the tier price.
    #[serde(default)]
    pub amount_paid_cents: Option<i64>,
    /// Payment instant; defaults to now.
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Request to renew an existing subscription into a fresh period.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenewSubscriptionRequest {
    /// Start of the new period; defaults to the day after the prior window
    /// ends.
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    /// Tier for the new period; defaults to the prior subscription's tier.
    #[serde(default)]
    pub tier_id: Option<Uuid>,
    #[serde(default)]
    pub amount_paid_cents: Option<i64>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Partial update of a subscription; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubscriptionRequest {
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub amount_paid_cents: Option<i64>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Request to terminate a subscription early.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TerminateSubscriptionRequest {
    /// Effective end of access; defaults to now.
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

/// Request to grant a client direct access to a service.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantAccessRequest {
    pub client_id: Uuid,
    pub service_id: Uuid,
    /// Optional subscription the grant is issued under.
    #[serde(default)]
    pub subscription_id: Option<Uuid>,
    pub valid_from: DateTime<Utc>,
    /// Absent leaves the grant open-ended.
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

/// Full window replacement for an existing grant.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAccessGrantRequest {
    pub valid_from: DateTime<Utc>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

/// Target service set for a subscription type; the reconciler diffs it
/// against the stored set.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileTypeServicesRequest {
    pub service_ids: Vec<Uuid>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Query DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Filter criteria for listing subscriptions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSubscriptionsQuery {
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub type_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub valid_from_min: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_from_max: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until_min: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until_max: Option<DateTime<Utc>>,
}

/// Horizon for the expiring-soon listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpiringQuery {
    pub days: i64,
}

/// Pair plus optional evaluation instant for an access check.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckAccessQuery {
    pub client_id: Uuid,
    pub service_id: Uuid,
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

/// Optional evaluation instant for active-grant listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActiveAtQuery {
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Subscription details for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub client_id: String,
    pub type_id: String,
    pub tier_id: String,
    pub valid_from: String,
    pub valid_until: String,
    pub amount_paid_cents: i64,
    pub paid_at: String,
    pub status: SubscriptionStatus,
    pub payment_method: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id.to_string(),
            client_id: s.client_id.to_string(),
            type_id: s.type_id.to_string(),
            tier_id: s.tier_id.to_string(),
            valid_from: s.valid_from.as_datetime().to_rfc3339(),
            valid_until: s.valid_until.as_datetime().to_rfc3339(),
            amount_paid_cents: s.amount_paid_cents,
            paid_at: s.paid_at.as_datetime().to_rfc3339(),
            status: s.status,
            payment_method: s.payment_method,
            created_at: s.created_at.as_datetime().to_rfc3339(),
            updated_at: s.updated_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Access grant details for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct AccessGrantResponse {
    pub id: String,
    pub client_id: String,
    pub service_id: String,
    pub subscription_id: Option<String>,
    pub valid_from: String,
    /// Null for open-ended grants.
    pub valid_until: Option<String>,
    pub created_at: String,
}

impl From<AccessGrant> for AccessGrantResponse {
    fn from(g: AccessGrant) -> Self {
        Self {
            id: g.id.to_string(),
            client_id: g.client_id.to_string(),
            service_id: g.service_id.to_string(),
            subscription_id: g.subscription_id.map(|id| id.to_string()),
            valid_from: g.window.from().as_datetime().to_rfc3339(),
            valid_until: g.window.until().map(|t| t.as_datetime().to_rfc3339()),
            created_at: g.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Service details for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub standard_duration_min: Option<i32>,
    pub max_capacity: Option<i32>,
}

impl From<Service> for ServiceResponse {
    fn from(s: Service) -> Self {
        Self {
            id: s.id.to_string(),
            name: s.name,
            description: s.description,
            enabled: s.enabled,
            standard_duration_min: s.standard_duration_min,
            max_capacity: s.max_capacity,
        }
    }
}

/// Client details for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ClientResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub enabled: bool,
    pub registered_at: String,
}

impl From<Client> for ClientResponse {
    fn from(c: Client) -> Self {
        Self {
            id: c.id.to_string(),
            first_name: c.first_name,
            last_name: c.last_name,
            phone: c.phone,
            email: c.email,
            enabled: c.enabled,
            registered_at: c.registered_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Response for a subscription purchase.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSubscriptionResponse {
    pub subscription: SubscriptionResponse,
    /// Grants provisioned by the cascade.
    pub grants_created: u64,
}

/// Response for a subscription renewal.
#[derive(Debug, Clone, Serialize)]
pub struct RenewSubscriptionResponse {
    pub subscription: SubscriptionResponse,
    pub grants_extended: u64,
    pub grants_created: u64,
}

/// Response for an early termination.
#[derive(Debug, Clone, Serialize)]
pub struct TerminateSubscriptionResponse {
    pub subscription: SubscriptionResponse,
    pub grants_shortened: u64,
}

/// Subscription with the grants it provisioned.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionDetailResponse {
    pub subscription: SubscriptionResponse,
    pub grants: Vec<AccessGrantResponse>,
}

/// Response for subscription listings.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionListResponse {
    pub subscriptions: Vec<SubscriptionResponse>,
}

/// Response for an access check.
#[derive(Debug, Clone, Serialize)]
pub struct AccessCheckResponse {
    pub allowed: bool,
    /// The grant backing the decision, when one exists for the pair.
    pub grant: Option<AccessGrantResponse>,
}

/// One service a client can currently use, with the backing grant.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveServiceResponse {
    pub service: ServiceResponse,
    pub grant: AccessGrantResponse,
}

/// Response for a client's active services.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveServicesResponse {
    pub items: Vec<ActiveServiceResponse>,
}

/// One client currently allowed into a service, with the backing grant.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveClientResponse {
    pub client: ClientResponse,
    pub grant: AccessGrantResponse,
}

/// Response for a service's active clients.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveClientsResponse {
    pub items: Vec<ActiveClientResponse>,
}

/// Outcome of a type/service reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileTypeServicesResponse {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: usize,
}

/// Response for a subscription type's grantable services.
#[derive(Debug, Clone, Serialize)]
pub struct TypeServicesResponse {
    pub services: Vec<ServiceResponse>,
}

/// Outcome of an expiration sweep pass.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    pub swept: u64,
    pub failed: u64,
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Extra context, keyed by field or entity.
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub details: std::collections::HashMap<String, String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: std::collections::HashMap::new(),
        }
    }
}
