//! RemoveSubscriptionHandler - hard delete of a subscription row.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId};
use crate::domain::subscription::Subscription;
use crate::ports::{AccessGrantRepository, SubscriptionRepository};

#[derive(Debug, Clone)]
pub struct RemoveSubscriptionCommand {
    pub subscription_id: SubscriptionId,
}

#[derive(Debug, Clone)]
pub struct RemoveSubscriptionResult {
    pub subscription: Subscription,
}

/// Handler deleting a subscription outright (data-entry mistakes).
///
/// Refused while any grant still references the row; the caller must revoke
/// or re-home those grants first. Terminate is the normal way to end a
/// subscription.
pub struct RemoveSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    grants: Arc<dyn AccessGrantRepository>,
}

impl RemoveSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        grants: Arc<dyn AccessGrantRepository>,
    ) -> Self {
        Self {
            subscriptions,
            grants,
        }
    }

    pub async fn handle(
        &self,
        cmd: RemoveSubscriptionCommand,
    ) -> Result<RemoveSubscriptionResult, DomainError> {
        let subscription = self
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

        let dependents = self.grants.count_for_subscription(&subscription.id).await?;
        if dependents > 0 {
            return Err(DomainError::new(
                ErrorCode::HasDependents,
                format!(
                    "Subscription {} still has {} access grant(s)",
                    subscription.id, dependents
                ),
            ));
        }

        self.subscriptions.delete(&subscription.id).await?;

        Ok(RemoveSubscriptionResult { subscription })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryStore;
    use crate::domain::access::AccessGrant;
    use crate::domain::foundation::{
        AccessGrantId, AccessWindow, ClientId, PriceTierId, ServiceId, SubscriptionTypeId,
        Timestamp,
    };
    use crate::domain::subscription::SubscriptionStatus;

    fn day(d: u32) -> Timestamp {
        Timestamp::from_ymd(2025, 1, d).unwrap()
    }

    fn seed(store: &InMemoryStore) -> (SubscriptionId, ClientId) {
        let sub = Subscription::new(
            SubscriptionId::new(),
            ClientId::new(),
            SubscriptionTypeId::new(),
            PriceTierId::new(),
            day(1),
            day(31),
            4500,
            day(1),
            SubscriptionStatus::Active,
            None,
            day(1),
        )
        .unwrap();
        let (id, client_id) = (sub.id, sub.client_id);
        store.seed_subscription(sub);
        (id, client_id)
    }

    #[tokio::test]
    async fn removes_subscription_without_grants() {
        let store = Arc::new(InMemoryStore::new());
        let (id, _) = seed(&store);
        let handler = RemoveSubscriptionHandler::new(store.clone(), store.clone());

        let result = handler
            .handle(RemoveSubscriptionCommand { subscription_id: id })
            .await
            .unwrap();

        assert_eq!(result.subscription.id, id);
        assert!(store.all_subscriptions().is_empty());
    }

    #[tokio::test]
    async fn refuses_while_grants_reference_it() {
        let store = Arc::new(InMemoryStore::new());
        let (id, client_id) = seed(&store);
        store.seed_grant(AccessGrant::new(
            AccessGrantId::new(),
            client_id,
            ServiceId::new(),
            Some(id),
            AccessWindow::bounded(day(1), day(31)).unwrap(),
            day(1),
        ));
        let handler = RemoveSubscriptionHandler::new(store.clone(), store.clone());

        let err = handler
            .handle(RemoveSubscriptionCommand { subscription_id: id })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::HasDependents);
        assert_eq!(store.all_subscriptions().len(), 1);
    }

    #[tokio::test]
    async fn fails_for_unknown_subscription() {
        let store = Arc::new(InMemoryStore::new());
        let handler = RemoveSubscriptionHandler::new(store.clone(), store.clone());

        let err = handler
            .handle(RemoveSubscriptionCommand {
                subscription_id: SubscriptionId::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }
}
