//! Atomic multi-row write port for subscription cascades.
//!
//! Every write that touches a subscription row together with its grants goes
//! through this port, so implementations can wrap the whole cascade in one
//! storage transaction: either everything applies or nothing does. A crash
//! or error mid-sequence must leave prior state unchanged.

use async_trait::async_trait;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp};
use crate::domain::subscription::Subscription;

/// Transactional store for subscription + grant cascades.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Inserts the subscription and bulk-provisions its grants atomically.
    ///
    /// Grants whose (client, service) pair already exists are skipped, not
    /// overwritten - the idempotent provisioning rule. If any insert fails
    /// the subscription insert rolls back too; no orphan subscription
    /// without its grants.
    ///
    /// Returns the number of grants actually created.
    async fn create_with_grants(
        &self,
        subscription: &Subscription,
        grants: &[AccessGrant],
    ) -> Result<u64, DomainError>;

    /// Renewal cascade, atomic: inserts the new subscription row, extends
    /// every grant referencing `prior` to `extend_until`, and provisions
    /// `fresh_grants` for services without an existing (client, service)
    /// grant.
    ///
    /// Returns (extended, created) grant counts.
    async fn renew_with_grants(
        &self,
        subscription: &Subscription,
        prior: &SubscriptionId,
        fresh_grants: &[AccessGrant],
        extend_until: Timestamp,
    ) -> Result<(u64, u64), DomainError>;

    /// Persists an edited subscription; when `rewrite_until` is set, every
    /// grant referencing it gets that end date in the same transaction
    /// (extension or contraction - unlike termination, both are allowed).
    async fn update_with_rewrite(
        &self,
        subscription: &Subscription,
        rewrite_until: Option<Timestamp>,
    ) -> Result<(), DomainError>;

    /// Termination cascade, atomic: persists the cancelled subscription and
    /// shortens to `at` every grant referencing it whose end is absent or
    /// later than `at`. Grants already ending at or before `at` are left
    /// untouched.
    ///
    /// Returns the number of grants shortened.
    async fn terminate(
        &self,
        subscription: &Subscription,
        at: Timestamp,
    ) -> Result<u64, DomainError>;
}
