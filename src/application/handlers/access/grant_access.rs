//! GrantAccessHandler - Command handler for issuing a direct access grant.

use std::sync::Arc;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{
    AccessGrantId, AccessWindow, ClientId, DomainError, ErrorCode, ServiceId, SubscriptionId,
    Timestamp,
};
use crate::domain::subscription::StatusBucket;
use crate::ports::{
    AccessGrantRepository, ClientRepository, Clock, ServiceRepository, SubscriptionRepository,
};

/// Command to grant a client access to a service.
#[derive(Debug, Clone)]
pub struct GrantAccessCommand {
    pub client_id: ClientId,
    pub service_id: ServiceId,
    /// Optional subscription the grant is issued under.
    pub subscription_id: Option<SubscriptionId>,
    pub from: Timestamp,
    /// `None` leaves the grant open-ended.
    pub until: Option<Timestamp>,
}

/// Result of a successful grant.
#[derive(Debug, Clone)]
pub struct GrantAccessResult {
    pub grant: AccessGrant,
}

/// Handler for issuing a single access grant.
///
/// Grants issued under a subscription must reference a subscription that
/// belongs to the client and is currently active; stand-alone grants only
/// need the client and an enabled service.
pub struct GrantAccessHandler {
    clients: Arc<dyn ClientRepository>,
    services: Arc<dyn ServiceRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    grants: Arc<dyn AccessGrantRepository>,
    clock: Arc<dyn Clock>,
}

impl GrantAccessHandler {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        services: Arc<dyn ServiceRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        grants: Arc<dyn AccessGrantRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            clients,
            services,
            subscriptions,
            grants,
            clock,
        }
    }

    pub async fn handle(&self, cmd: GrantAccessCommand) -> Result<GrantAccessResult, DomainError> {
        let now = self.clock.now();

        // 1. Client must exist
        self.clients
            .find_by_id(&cmd.client_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(ErrorCode::ClientNotFound, "Client", cmd.client_id)
            })?;

        // 2. Service must exist and be enabled
        let service = self
            .services
            .find_by_id(&cmd.service_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(ErrorCode::ServiceNotFound, "Service", cmd.service_id)
            })?;
        if !service.enabled {
            return Err(DomainError::new(
                ErrorCode::ServiceDisabled,
                format!("Service '{}' is disabled", service.name),
            ));
        }

        // 3. If issued under a subscription, it must belong to the client
        //    and still be running
        if let Some(subscription_id) = cmd.subscription_id {
            let subscription = self
                .subscriptions
                .find_by_id(&subscription_id)
                .await?
                .ok_or_else(|| {
                    DomainError::not_found(
                        ErrorCode::SubscriptionNotFound,
                        "Subscription",
                        subscription_id,
                    )
                })?;
            if subscription.client_id != cmd.client_id {
                return Err(DomainError::new(
                    ErrorCode::SubscriptionMismatch,
                    "Subscription does not belong to this client",
                ));
            }
            if subscription.status.bucket() != StatusBucket::Active
                || subscription.window_closed_at(now)
            {
                return Err(DomainError::new(
                    ErrorCode::SubscriptionNotActive,
                    format!("Subscription {} is not active", subscription_id),
                ));
            }
        }

        // 4. Validate the window and insert; the repository rejects a second
        //    grant for the same (client, service) pair
        let window = AccessWindow::new(cmd.from, cmd.until)?;
        let grant = AccessGrant::new(
            AccessGrantId::new(),
            cmd.client_id,
            cmd.service_id,
            cmd.subscription_id,
            window,
            now,
        );
        self.grants.insert(&grant).await?;

        Ok(GrantAccessResult { grant })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryStore;
    use crate::domain::catalog::{Client, Service};
    use crate::domain::foundation::{PriceTierId, SubscriptionTypeId};
    use crate::domain::subscription::{Subscription, SubscriptionStatus};
    use crate::ports::FixedClock;

    fn day(d: u32) -> Timestamp {
        Timestamp::from_ymd(2025, 1, d).unwrap()
    }

    fn handler(store: &Arc<InMemoryStore>, now: Timestamp) -> GrantAccessHandler {
        GrantAccessHandler::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(FixedClock(now)),
        )
    }

    fn seed_client(store: &InMemoryStore) -> ClientId {
        let client = Client::new(
            ClientId::new(),
            "Nadia",
            "Benali",
            "+33600000001",
            None,
            day(1),
        )
        .unwrap();
        let id = client.id;
        store.seed_client(client);
        id
    }

    fn seed_service(store: &InMemoryStore, enabled: bool) -> ServiceId {
        let mut service = Service::new(ServiceId::new(), "Pool", None).unwrap();
        service.enabled = enabled;
        let id = service.id;
        store.seed_service(service);
        id
    }

    fn seed_subscription(
        store: &InMemoryStore,
        client_id: ClientId,
        status: SubscriptionStatus,
    ) -> SubscriptionId {
        let sub = Subscription::new(
            SubscriptionId::new(),
            client_id,
            SubscriptionTypeId::new(),
            PriceTierId::new(),
            day(1),
            day(31),
            4500,
            day(1),
            status,
            None,
            day(1),
        )
        .unwrap();
        let id = sub.id;
        store.seed_subscription(sub);
        id
    }

    fn command(client_id: ClientId, service_id: ServiceId) -> GrantAccessCommand {
        GrantAccessCommand {
            client_id,
            service_id,
            subscription_id: None,
            from: day(1),
            until: Some(day(31)),
        }
    }

    #[tokio::test]
    async fn grants_access_for_enabled_service() {
        let store = Arc::new(InMemoryStore::new());
        let client_id = seed_client(&store);
        let service_id = seed_service(&store, true);

        let result = handler(&store, day(5))
            .handle(command(client_id, service_id))
            .await
            .unwrap();

        assert_eq!(result.grant.client_id, client_id);
        assert_eq!(result.grant.service_id, service_id);
        assert_eq!(store.all_grants().len(), 1);
    }

    #[tokio::test]
    async fn fails_for_unknown_client() {
        let store = Arc::new(InMemoryStore::new());
        let service_id = seed_service(&store, true);

        let err = handler(&store, day(5))
            .handle(command(ClientId::new(), service_id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ClientNotFound);
    }

    #[tokio::test]
    async fn fails_for_disabled_service() {
        let store = Arc::new(InMemoryStore::new());
        let client_id = seed_client(&store);
        let service_id = seed_service(&store, false);

        let err = handler(&store, day(5))
            .handle(command(client_id, service_id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ServiceDisabled);
    }

    #[tokio::test]
    async fn fails_for_inverted_window() {
        let store = Arc::new(InMemoryStore::new());
        let client_id = seed_client(&store);
        let service_id = seed_service(&store, true);

        let mut cmd = command(client_id, service_id);
        cmd.from = day(20);
        cmd.until = Some(day(10));

        let err = handler(&store, day(5)).handle(cmd).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidWindow);
    }

    #[tokio::test]
    async fn fails_when_pair_already_granted() {
        let store = Arc::new(InMemoryStore::new());
        let client_id = seed_client(&store);
        let service_id = seed_service(&store, true);
        let h = handler(&store, day(5));

        h.handle(command(client_id, service_id)).await.unwrap();
        let err = h.handle(command(client_id, service_id)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateGrant);
    }

    #[tokio::test]
    async fn fails_when_subscription_belongs_to_other_client() {
        let store = Arc::new(InMemoryStore::new());
        let client_id = seed_client(&store);
        let other_id = seed_client(&store);
        let service_id = seed_service(&store, true);
        let subscription_id = seed_subscription(&store, other_id, SubscriptionStatus::Active);

        let mut cmd = command(client_id, service_id);
        cmd.subscription_id = Some(subscription_id);

        let err = handler(&store, day(5)).handle(cmd).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionMismatch);
    }

    #[tokio::test]
    async fn fails_when_subscription_is_cancelled() {
        let store = Arc::new(InMemoryStore::new());
        let client_id = seed_client(&store);
        let service_id = seed_service(&store, true);
        let subscription_id = seed_subscription(&store, client_id, SubscriptionStatus::Cancelled);

        let mut cmd = command(client_id, service_id);
        cmd.subscription_id = Some(subscription_id);

        let err = handler(&store, day(5)).handle(cmd).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionNotActive);
    }

    #[tokio::test]
    async fn fails_when_subscription_window_has_closed() {
        let store = Arc::new(InMemoryStore::new());
        let client_id = seed_client(&store);
        let service_id = seed_service(&store, true);
        let subscription_id = seed_subscription(&store, client_id, SubscriptionStatus::Active);

        let mut cmd = command(client_id, service_id);
        cmd.subscription_id = Some(subscription_id);

        // Window ends Jan 31; checking on Feb 10.
        let err = handler(&store, Timestamp::from_ymd(2025, 2, 10).unwrap())
            .handle(cmd)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionNotActive);
    }

    #[tokio::test]
    async fn open_ended_grant_is_allowed() {
        let store = Arc::new(InMemoryStore::new());
        let client_id = seed_client(&store);
        let service_id = seed_service(&store, true);

        let mut cmd = command(client_id, service_id);
        cmd.until = None;

        let result = handler(&store, day(5)).handle(cmd).await.unwrap();
        assert_eq!(result.grant.window.until(), None);
    }
}
