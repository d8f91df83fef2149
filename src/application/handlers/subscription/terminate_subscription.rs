//! TerminateSubscriptionHandler - early cancellation with grant shortening.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::domain::subscription::Subscription;
use crate::ports::{Clock, SubscriptionRepository, SubscriptionStore};

/// Command to terminate a subscription ahead of its natural end.
#[derive(Debug, Clone)]
pub struct TerminateSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    /// Effective end of access; defaults to now.
    pub at: Option<Timestamp>,
}

#[derive(Debug, Clone)]
pub struct TerminateSubscriptionResult {
    pub subscription: Subscription,
    /// Grants whose end moved to the termination instant.
    pub grants_shortened: u64,
}

/// Handler for manual termination.
///
/// The subscription transitions to Cancelled and every grant it provisioned
/// is shortened to the termination instant. Shortening only: a grant
/// already ending earlier keeps its end, so termination can never extend
/// access. The status write and the grant rewrites commit together.
pub struct TerminateSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    store: Arc<dyn SubscriptionStore>,
    clock: Arc<dyn Clock>,
}

impl TerminateSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        store: Arc<dyn SubscriptionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            subscriptions,
            store,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: TerminateSubscriptionCommand,
    ) -> Result<TerminateSubscriptionResult, DomainError> {
        let now = self.clock.now();
        let at = cmd.at.unwrap_or(now);

        let mut subscription = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(
                    ErrorCode::SubscriptionNotFound,
                    "Subscription",
                    cmd.subscription_id,
                )
            })?;

        // Closed subscriptions cannot be terminated again.
        subscription.cancel(now)?;

        let grants_shortened = self.store.terminate(&subscription, at).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            at = %at,
            grants_shortened,
            "subscription terminated"
        );

        Ok(TerminateSubscriptionResult {
            subscription,
            grants_shortened,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryStore;
    use crate::domain::access::AccessGrant;
    use crate::domain::foundation::{
        AccessGrantId, AccessWindow, ClientId, PriceTierId, ServiceId, SubscriptionTypeId,
    };
    use crate::domain::subscription::SubscriptionStatus;
    use crate::ports::FixedClock;

    fn day(m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd(2025, m, d).unwrap()
    }

    fn seed(store: &InMemoryStore) -> (SubscriptionId, ClientId) {
        let sub = Subscription::new(
            SubscriptionId::new(),
            ClientId::new(),
            SubscriptionTypeId::new(),
            PriceTierId::new(),
            day(1, 1),
            day(1, 31),
            4500,
            day(1, 1),
            SubscriptionStatus::Active,
            None,
            day(1, 1),
        )
        .unwrap();
        let (id, client_id) = (sub.id, sub.client_id);
        store.seed_subscription(sub);
        (id, client_id)
    }

    fn seed_grant(
        store: &InMemoryStore,
        client_id: ClientId,
        subscription_id: Option<SubscriptionId>,
        until: Timestamp,
    ) -> AccessGrantId {
        let grant = AccessGrant::new(
            AccessGrantId::new(),
            client_id,
            ServiceId::new(),
            subscription_id,
            AccessWindow::bounded(day(1, 1), until).unwrap(),
            day(1, 1),
        );
        let id = grant.id;
        store.seed_grant(grant);
        id
    }

    fn handler(store: &Arc<InMemoryStore>, now: Timestamp) -> TerminateSubscriptionHandler {
        TerminateSubscriptionHandler::new(store.clone(), store.clone(), Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn cancels_and_shortens_provisioned_grants() {
        let store = Arc::new(InMemoryStore::new());
        let (id, client_id) = seed(&store);
        seed_grant(&store, client_id, Some(id), day(1, 31));
        seed_grant(&store, client_id, Some(id), day(1, 31));

        let result = handler(&store, day(1, 15))
            .handle(TerminateSubscriptionCommand {
                subscription_id: id,
                at: None,
            })
            .await
            .unwrap();

        assert_eq!(result.subscription.status, SubscriptionStatus::Cancelled);
        assert_eq!(result.grants_shortened, 2);
        for grant in store.all_grants() {
            assert_eq!(grant.window.until(), Some(day(1, 15)));
        }
    }

    #[tokio::test]
    async fn leaves_unrelated_grants_untouched() {
        let store = Arc::new(InMemoryStore::new());
        let (id, client_id) = seed(&store);
        seed_grant(&store, client_id, Some(id), day(1, 31));
        let direct = seed_grant(&store, client_id, None, day(1, 31));

        handler(&store, day(1, 15))
            .handle(TerminateSubscriptionCommand {
                subscription_id: id,
                at: None,
            })
            .await
            .unwrap();

        let direct_grant = store
            .all_grants()
            .into_iter()
            .find(|g| g.id == direct)
            .unwrap();
        assert_eq!(direct_grant.window.until(), Some(day(1, 31)));
    }

    #[tokio::test]
    async fn never_extends_an_earlier_end() {
        let store = Arc::new(InMemoryStore::new());
        let (id, client_id) = seed(&store);
        let early = seed_grant(&store, client_id, Some(id), day(1, 10));

        let result = handler(&store, day(1, 15))
            .handle(TerminateSubscriptionCommand {
                subscription_id: id,
                at: None,
            })
            .await
            .unwrap();

        assert_eq!(result.grants_shortened, 0);
        let grant = store
            .all_grants()
            .into_iter()
            .find(|g| g.id == early)
            .unwrap();
        assert_eq!(grant.window.until(), Some(day(1, 10)));
    }

    #[tokio::test]
    async fn explicit_instant_overrides_now() {
        let store = Arc::new(InMemoryStore::new());
        let (id, client_id) = seed(&store);
        seed_grant(&store, client_id, Some(id), day(1, 31));

        handler(&store, day(1, 15))
            .handle(TerminateSubscriptionCommand {
                subscription_id: id,
                at: Some(day(1, 20)),
            })
            .await
            .unwrap();

        assert_eq!(store.all_grants()[0].window.until(), Some(day(1, 20)));
    }

    #[tokio::test]
    async fn terminating_twice_fails() {
        let store = Arc::new(InMemoryStore::new());
        let (id, _) = seed(&store);
        let h = handler(&store, day(1, 15));

        h.handle(TerminateSubscriptionCommand {
            subscription_id: id,
            at: None,
        })
        .await
        .unwrap();
        let err = h
            .handle(TerminateSubscriptionCommand {
                subscription_id: id,
                at: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn fails_for_unknown_subscription() {
        let store = Arc::new(InMemoryStore::new());

        let err = handler(&store, day(1, 15))
            .handle(TerminateSubscriptionCommand {
                subscription_id: SubscriptionId::new(),
                at: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }
}
