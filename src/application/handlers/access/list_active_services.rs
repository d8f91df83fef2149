//! ListActiveServicesHandler - services a client can currently use.

use std::sync::Arc;

use crate::domain::access::AccessGrant;
use crate::domain::catalog::Service;
use crate::domain::foundation::{ClientId, DomainError, ErrorCode, Timestamp};
use crate::ports::{AccessGrantRepository, ClientRepository, Clock, ServiceRepository};

#[derive(Debug, Clone)]
pub struct ListActiveServicesCommand {
    pub client_id: ClientId,
    /// Instant to evaluate at; defaults to the current time.
    pub at: Option<Timestamp>,
}

/// A grant paired with the service it opens.
#[derive(Debug, Clone)]
pub struct ActiveService {
    pub grant: AccessGrant,
    pub service: Service,
}

#[derive(Debug, Clone)]
pub struct ListActiveServicesResult {
    pub items: Vec<ActiveService>,
}

pub struct ListActiveServicesHandler {
    clients: Arc<dyn ClientRepository>,
    services: Arc<dyn ServiceRepository>,
    grants: Arc<dyn AccessGrantRepository>,
    clock: Arc<dyn Clock>,
}

impl ListActiveServicesHandler {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        services: Arc<dyn ServiceRepository>,
        grants: Arc<dyn AccessGrantRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            clients,
            services,
            grants,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: ListActiveServicesCommand,
    ) -> Result<ListActiveServicesResult, DomainError> {
        let at = cmd.at.unwrap_or_else(|| self.clock.now());

        self.clients
            .find_by_id(&cmd.client_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(ErrorCode::ClientNotFound, "Client", cmd.client_id)
            })?;

        let grants = self.grants.active_for_client(&cmd.client_id, at).await?;
        let service_ids: Vec<_> = grants.iter().map(|g| g.service_id).collect();
        let services = self.services.find_by_ids(&service_ids).await?;

        let items = grants
            .into_iter()
            .filter_map(|grant| {
                services
                    .iter()
                    .find(|s| s.id == grant.service_id)
                    .cloned()
                    .map(|service| ActiveService { grant, service })
            })
            .collect();

        Ok(ListActiveServicesResult { items })
    }
}
