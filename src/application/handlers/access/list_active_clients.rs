//! ListActiveClientsHandler - clients currently holding access to a service.

use std::sync::Arc;

use crate::domain::access::AccessGrant;
use crate::domain::catalog::Client;
use crate::domain::foundation::{DomainError, ErrorCode, ServiceId, Timestamp};
use crate::ports::{AccessGrantRepository, ClientRepository, Clock, ServiceRepository};

#[derive(Debug, Clone)]
pub struct ListActiveClientsCommand {
    pub service_id: ServiceId,
    /// Instant to evaluate at; defaults to the current time.
    pub at: Option<Timestamp>,
}

/// A grant paired with the client holding it.
#[derive(Debug, Clone)]
pub struct ActiveClient {
    pub grant: AccessGrant,
    pub client: Client,
}

#[derive(Debug, Clone)]
pub struct ListActiveClientsResult {
    pub items: Vec<ActiveClient>,
}

pub struct ListActiveClientsHandler {
    clients: Arc<dyn ClientRepository>,
    services: Arc<dyn ServiceRepository>,
    grants: Arc<dyn AccessGrantRepository>,
    clock: Arc<dyn Clock>,
}

impl ListActiveClientsHandler {
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
        cmd: ListActiveClientsCommand,
    ) -> Result<ListActiveClientsResult, DomainError> {
        let at = cmd.at.unwrap_or_else(|| self.clock.now());

        self.services
            .find_by_id(&cmd.service_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(ErrorCode::ServiceNotFound, "Service", cmd.service_id)
            })?;

        let grants = self.grants.active_for_service(&cmd.service_id, at).await?;
        let mut items = Vec::with_capacity(grants.len());
        for grant in grants {
            if let Some(client) = self.clients.find_by_id(&grant.client_id).await? {
                items.push(ActiveClient { grant, client });
            }
        }

        Ok(ListActiveClientsResult { items })
    }
}
