//! Type/service association port - the reconciler's storage contract.

use async_trait::async_trait;

use crate::domain::catalog::Service;
use crate::domain::foundation::{DomainError, ServiceId, SubscriptionTypeId};

/// Storage for the (type, service) association set.
///
/// Implementations must enforce a unique constraint per (type, service)
/// pair: the grantable-service set of a type never contains duplicates.
#[async_trait]
pub trait TypeServiceRepository: Send + Sync {
    /// Ids of the services currently associated with the type.
    async fn service_ids_for(
        &self,
        type_id: &SubscriptionTypeId,
    ) -> Result<Vec<ServiceId>, DomainError>;

    /// Full service records currently associated with the type.
    async fn services_for(
        &self,
        type_id: &SubscriptionTypeId,
    ) -> Result<Vec<Service>, DomainError>;

    /// Applies a reconciliation diff atomically: removes `to_remove`, then
    /// inserts `to_add`.
    ///
    /// The insert path must re-check membership (or rely on the unique
    /// constraint with a do-nothing conflict action) so a concurrent insert
    /// of the same pair cannot produce a duplicate. Either the whole diff
    /// applies or none of it does.
    async fn apply_diff(
        &self,
        type_id: &SubscriptionTypeId,
        to_add: &[ServiceId],
        to_remove: &[ServiceId],
    ) -> Result<(), DomainError>;
}
