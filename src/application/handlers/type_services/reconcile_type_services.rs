//! ReconcileTypeServicesHandler - converges a type's service set to a target.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, ServiceId, SubscriptionTypeId};
use crate::ports::{ServiceRepository, SubscriptionTypeRepository, TypeServiceRepository};

/// Command declaring the full desired service set of a subscription type.
///
/// Reconciliation is declarative: the stored association set converges to
/// `service_ids`, whatever it held before. Duplicates in the input are
/// collapsed.
#[derive(Debug, Clone)]
pub struct ReconcileTypeServicesCommand {
    pub type_id: SubscriptionTypeId,
    pub service_ids: Vec<ServiceId>,
}

/// The applied diff.
#[derive(Debug, Clone)]
pub struct ReconcileTypeServicesResult {
    pub added: Vec<ServiceId>,
    pub removed: Vec<ServiceId>,
    pub unchanged: usize,
}

/// Handler computing and applying the association diff.
///
/// Only the rows in the diff are written; associations already matching the
/// target are left untouched, so running the same command twice applies an
/// empty diff the second time.
pub struct ReconcileTypeServicesHandler {
    types: Arc<dyn SubscriptionTypeRepository>,
    services: Arc<dyn ServiceRepository>,
    associations: Arc<dyn TypeServiceRepository>,
}

impl ReconcileTypeServicesHandler {
    pub fn new(
        types: Arc<dyn SubscriptionTypeRepository>,
        services: Arc<dyn ServiceRepository>,
        associations: Arc<dyn TypeServiceRepository>,
    ) -> Self {
        Self {
            types,
            services,
            associations,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReconcileTypeServicesCommand,
    ) -> Result<ReconcileTypeServicesResult, DomainError> {
        // 1. Type must exist
        self.types.find_by_id(&cmd.type_id).await?.ok_or_else(|| {
            DomainError::not_found(ErrorCode::TypeNotFound, "Subscription type", cmd.type_id)
        })?;

        // 2. Collapse duplicates, preserving first occurrence
        let mut desired: Vec<ServiceId> = Vec::with_capacity(cmd.service_ids.len());
        for id in &cmd.service_ids {
            if !desired.contains(id) {
                desired.push(*id);
            }
        }

        // 3. Every desired service must exist
        let found = self.services.find_by_ids(&desired).await?;
        if found.len() != desired.len() {
            let missing = desired
                .iter()
                .find(|id| !found.iter().any(|s| s.id == **id));
            let mut err = DomainError::new(
                ErrorCode::ServiceNotFound,
                "Desired service set references a service that does not exist",
            );
            if let Some(id) = missing {
                err = err.with_detail("service_id", id.to_string());
            }
            return Err(err);
        }

        // 4. Diff against the stored set
        let current = self.associations.service_ids_for(&cmd.type_id).await?;
        let added: Vec<ServiceId> = desired
            .iter()
            .filter(|id| !current.contains(id))
            .copied()
            .collect();
        let removed: Vec<ServiceId> = current
            .iter()
            .filter(|id| !desired.contains(id))
            .copied()
            .collect();
        let unchanged = desired.len() - added.len();

        // 5. Apply only if something changed
        if !added.is_empty() || !removed.is_empty() {
            self.associations
                .apply_diff(&cmd.type_id, &added, &removed)
                .await?;
        }

        tracing::debug!(
            type_id = %cmd.type_id,
            added = added.len(),
            removed = removed.len(),
            unchanged,
            "reconciled type service set"
        );

        Ok(ReconcileTypeServicesResult {
            added,
            removed,
            unchanged,
        })
    }
}
