//! ListTypeServicesHandler - current service set of a subscription type.

use std::sync::Arc;

use crate::domain::catalog::Service;
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionTypeId};
use crate::ports::{SubscriptionTypeRepository, TypeServiceRepository};

#[derive(Debug, Clone)]
pub struct ListTypeServicesCommand {
    pub type_id: SubscriptionTypeId,
}

#[derive(Debug, Clone)]
pub struct ListTypeServicesResult {
    pub services: Vec<Service>,
}

pub struct ListTypeServicesHandler {
    types: Arc<dyn SubscriptionTypeRepository>,
    associations: Arc<dyn TypeServiceRepository>,
}

impl ListTypeServicesHandler {
    pub fn new(
        types: Arc<dyn SubscriptionTypeRepository>,
        associations: Arc<dyn TypeServiceRepository>,
    ) -> Self {
        Self {
            types,
            associations,
        }
    }

    pub async fn handle(
        &self,
        cmd: ListTypeServicesCommand,
    ) -> Result<ListTypeServicesResult, DomainError> {
        self.types.find_by_id(&cmd.type_id).await?.ok_or_else(|| {
            DomainError::not_found(ErrorCode::TypeNotFound, "Subscription type", cmd.type_id)
        })?;

        let services = self.associations.services_for(&cmd.type_id).await?;
        Ok(ListTypeServicesResult { services })
    }
}
