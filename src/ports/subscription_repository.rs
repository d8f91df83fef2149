//! Subscription repository port (single-row reads and writes).
//!
//! Multi-row cascades (provisioning, rewrites, termination) go through
//! [`SubscriptionStore`](crate::ports::SubscriptionStore) instead so they
//! can run inside one transaction.

use async_trait::async_trait;

use crate::domain::foundation::{ClientId, DomainError, SubscriptionId, SubscriptionTypeId, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionStatus};

/// Filters for subscription listings.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub client_id: Option<ClientId>,
    pub type_id: Option<SubscriptionTypeId>,
    pub status: Option<SubscriptionStatus>,
    pub valid_from_min: Option<Timestamp>,
    pub valid_from_max: Option<Timestamp>,
    pub valid_until_min: Option<Timestamp>,
    pub valid_until_max: Option<Timestamp>,
}

/// Repository port for subscription rows.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// List subscriptions matching the filter, most recent window end first.
    async fn list(&self, filter: &SubscriptionFilter) -> Result<Vec<Subscription>, DomainError>;

    /// Persist an updated subscription row.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the row does not exist
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Delete a subscription row.
    ///
    /// Callers must first verify no grant references it.
    async fn delete(&self, id: &SubscriptionId) -> Result<(), DomainError>;

    /// Active-bucket subscriptions whose window has closed (`valid_until <
    /// now`), the sweeper's work list. Must read fresh state on every call.
    async fn find_expired_active(&self, now: Timestamp)
        -> Result<Vec<Subscription>, DomainError>;

    /// Active-bucket subscriptions ending within `days` of `now`, soonest
    /// first (renewal-reminder listing).
    async fn find_expiring_within(
        &self,
        now: Timestamp,
        days: i64,
    ) -> Result<Vec<Subscription>, DomainError>;
}
