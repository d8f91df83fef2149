//! Subscription type and price tier entities.
//!
//! A subscription type is a named offering (e.g. "Full access", "Aqua only")
//! carrying priced tiers and a unique set of grantable services. The
//! service set itself lives in the type/service association table and is
//! managed by the reconciler.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    PriceTierId, ServiceId, SubscriptionTypeId, Timestamp, ValidationError,
};

/// A named subscription offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionType {
    pub id: SubscriptionTypeId,
    /// Unique across all types.
    pub name: String,
    pub description: Option<String>,
}

impl SubscriptionType {
    pub fn new(
        id: SubscriptionTypeId,
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
        })
    }
}

/// A priced period of a subscription type.
///
/// Money is stored as integer cents. Duration drives the renewal date math:
/// a subscription bought under a tier runs `duration_days` from its start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    pub id: PriceTierId,
    pub type_id: SubscriptionTypeId,
    pub duration_days: i64,
    pub price_cents: i64,
    /// Audience attribute (e.g. "standard", "student", "senior").
    pub audience: Option<String>,
}

impl PriceTier {
    pub fn new(
        id: PriceTierId,
        type_id: SubscriptionTypeId,
        duration_days: i64,
        price_cents: i64,
        audience: Option<String>,
    ) -> Result<Self, ValidationError> {
        if duration_days <= 0 {
            return Err(ValidationError::not_positive("duration_days", duration_days));
        }
        if price_cents < 0 {
            return Err(ValidationError::not_positive("price_cents", price_cents));
        }
        Ok(Self {
            id,
            type_id,
            duration_days,
            price_cents,
            audience,
        })
    }

    /// End of a period starting at `from` under this tier.
    pub fn period_end(&self, from: Timestamp) -> Timestamp {
        from.add_days(self.duration_days)
    }
}

/// A (type, service) association row - the reconciler's unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeServiceAssociation {
    pub type_id: SubscriptionTypeId,
    pub service_id: ServiceId,
}
