//! CheckAccessHandler - Query handler for the access decision point.

use std::sync::Arc;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{ClientId, DomainError, ErrorCode, ServiceId, Timestamp};
use crate::ports::{AccessGrantRepository, ClientRepository, Clock, ServiceRepository};

/// Command to check whether a client may use a service.
#[derive(Debug, Clone)]
pub struct CheckAccessCommand {
    pub client_id: ClientId,
    pub service_id: ServiceId,
    /// Instant to evaluate at; defaults to the current time.
    pub at: Option<Timestamp>,
}

/// Result of an access check.
#[derive(Debug, Clone)]
pub struct CheckAccessResult {
    pub allowed: bool,
    /// The grant backing the decision, when one exists for the pair.
    pub grant: Option<AccessGrant>,
}

/// Handler deciding whether a (client, service) pair has active access.
///
/// The decision reads fresh grant state on every call; a grant shortened by
/// a termination moments ago is already denied here.
pub struct CheckAccessHandler {
    clients: Arc<dyn ClientRepository>,
    services: Arc<dyn ServiceRepository>,
    grants: Arc<dyn AccessGrantRepository>,
    clock: Arc<dyn Clock>,
}

impl CheckAccessHandler {
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

    pub async fn handle(&self, cmd: CheckAccessCommand) -> Result<CheckAccessResult, DomainError> {
        let at = cmd.at.unwrap_or_else(|| self.clock.now());

        self.clients
            .find_by_id(&cmd.client_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(ErrorCode::ClientNotFound, "Client", cmd.client_id)
            })?;
        self.services
            .find_by_id(&cmd.service_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(ErrorCode::ServiceNotFound, "Service", cmd.service_id)
            })?;

        let grant = self
            .grants
            .find_pair(&cmd.client_id, &cmd.service_id)
            .await?;
        let allowed = grant.as_ref().is_some_and(|g| g.is_active_at(at));

        Ok(CheckAccessResult { allowed, grant })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryStore;
    use crate::domain::catalog::{Client, Service};
    use crate::domain::foundation::{AccessGrantId, AccessWindow};
    use crate::ports::FixedClock;

    fn day(d: u32) -> Timestamp {
        Timestamp::from_ymd(2025, 1, d).unwrap()
    }

    fn setup() -> (Arc<InMemoryStore>, ClientId, ServiceId) {
        let store = Arc::new(InMemoryStore::new());
        let client = Client::new(
            ClientId::new(),
            "Nadia",
            "Benali",
            "+33600000001",
            None,
            day(1),
        )
        .unwrap();
        let service = Service::new(ServiceId::new(), "Pool", None).unwrap();
        let (client_id, service_id) = (client.id, service.id);
        store.seed_client(client);
        store.seed_service(service);
        (store, client_id, service_id)
    }

    fn handler(store: &Arc<InMemoryStore>, now: Timestamp) -> CheckAccessHandler {
        CheckAccessHandler::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(FixedClock(now)),
        )
    }

    fn seed_grant(store: &InMemoryStore, client_id: ClientId, service_id: ServiceId) {
        store.seed_grant(AccessGrant::new(
            AccessGrantId::new(),
            client_id,
            service_id,
            None,
            AccessWindow::bounded(day(1), day(31)).unwrap(),
            day(1),
        ));
    }

    #[tokio::test]
    async fn allows_inside_window() {
        let (store, client_id, service_id) = setup();
        seed_grant(&store, client_id, service_id);

        let result = handler(&store, day(15))
            .handle(CheckAccessCommand {
                client_id,
                service_id,
                at: None,
            })
            .await
            .unwrap();
        assert!(result.allowed);
        assert!(result.grant.is_some());
    }

    #[tokio::test]
    async fn allows_on_window_endpoints() {
        let (store, client_id, service_id) = setup();
        seed_grant(&store, client_id, service_id);
        let h = handler(&store, day(15));

        for at in [day(1), day(31)] {
            let result = h
                .handle(CheckAccessCommand {
                    client_id,
                    service_id,
                    at: Some(at),
                })
                .await
                .unwrap();
            assert!(result.allowed);
        }
    }

    #[tokio::test]
    async fn denies_after_window() {
        let (store, client_id, service_id) = setup();
        seed_grant(&store, client_id, service_id);

        let result = handler(&store, Timestamp::from_ymd(2025, 2, 1).unwrap())
            .handle(CheckAccessCommand {
                client_id,
                service_id,
                at: None,
            })
            .await
            .unwrap();
        assert!(!result.allowed);
        // The lapsed grant is still reported for diagnostics.
        assert!(result.grant.is_some());
    }

    #[tokio::test]
    async fn denies_without_grant() {
        let (store, client_id, service_id) = setup();

        let result = handler(&store, day(15))
            .handle(CheckAccessCommand {
                client_id,
                service_id,
                at: None,
            })
            .await
            .unwrap();
        assert!(!result.allowed);
        assert!(result.grant.is_none());
    }

    #[tokio::test]
    async fn fails_for_unknown_service() {
        let (store, client_id, _) = setup();

        let err = handler(&store, day(15))
            .handle(CheckAccessCommand {
                client_id,
                service_id: ServiceId::new(),
                at: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ServiceNotFound);
    }
}
