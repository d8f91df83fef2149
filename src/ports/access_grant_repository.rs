//! Access grant repository port.

use async_trait::async_trait;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{
    AccessGrantId, ClientId, DomainError, ServiceId, SubscriptionId, Timestamp,
};

/// Repository port for service access grants.
///
/// Implementations must enforce the (client, service) uniqueness used by the
/// bulk-provisioning path: the same pair never gets a second provisioned
/// grant.
#[async_trait]
pub trait AccessGrantRepository: Send + Sync {
    /// Insert a single grant.
    ///
    /// # Errors
    ///
    /// - `DuplicateGrant` when the (client, service) pair already exists
    async fn insert(&self, grant: &AccessGrant) -> Result<(), DomainError>;

    /// Find a grant by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &AccessGrantId) -> Result<Option<AccessGrant>, DomainError>;

    /// Find the grant for a (client, service) pair, if any.
    async fn find_pair(
        &self,
        client_id: &ClientId,
        service_id: &ServiceId,
    ) -> Result<Option<AccessGrant>, DomainError>;

    /// Persist an updated grant.
    ///
    /// # Errors
    ///
    /// - `GrantNotFound` if the row does not exist
    async fn update(&self, grant: &AccessGrant) -> Result<(), DomainError>;

    /// Delete a grant.
    ///
    /// # Errors
    ///
    /// - `GrantNotFound` if the row does not exist
    async fn delete(&self, id: &AccessGrantId) -> Result<(), DomainError>;

    /// Grants of a client whose window is active at `at`, ordered by service.
    async fn active_for_client(
        &self,
        client_id: &ClientId,
        at: Timestamp,
    ) -> Result<Vec<AccessGrant>, DomainError>;

    /// Grants over a service whose window is active at `at`, ordered by
    /// client.
    async fn active_for_service(
        &self,
        service_id: &ServiceId,
        at: Timestamp,
    ) -> Result<Vec<AccessGrant>, DomainError>;

    /// All grants referencing a subscription.
    async fn find_by_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<AccessGrant>, DomainError>;

    /// Number of grants referencing a subscription (deletion guard).
    async fn count_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_grant_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn AccessGrantRepository) {}
    }
}
