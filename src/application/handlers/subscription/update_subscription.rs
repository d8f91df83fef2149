//! UpdateSubscriptionHandler - manual edit of a subscription row.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{Clock, SubscriptionRepository, SubscriptionStore};

/// Command editing subscription fields. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    pub valid_from: Option<Timestamp>,
    pub valid_until: Option<Timestamp>,
    /// Explicit status change, validated by the state machine.
    pub status: Option<SubscriptionStatus>,
    pub amount_paid_cents: Option<i64>,
    pub paid_at: Option<Timestamp>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateSubscriptionResult {
    pub subscription: Subscription,
}

/// Handler for manual subscription edits.
///
/// Changing `valid_until` rewrites the end date of every grant the
/// subscription provisioned, in the same transaction. Unlike termination
/// this rewrite goes both ways: an administrator extending the window
/// extends the grants too.
pub struct UpdateSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    store: Arc<dyn SubscriptionStore>,
    clock: Arc<dyn Clock>,
}

impl UpdateSubscriptionHandler {
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
        cmd: UpdateSubscriptionCommand,
    ) -> Result<UpdateSubscriptionResult, DomainError> {
        let now = self.clock.now();

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

        // 1. Window edit, revalidated as a whole
        let new_from = cmd.valid_from.unwrap_or(subscription.valid_from);
        let new_until = cmd.valid_until.unwrap_or(subscription.valid_until);
        let until_changed = new_until != subscription.valid_until;
        if new_from != subscription.valid_from || until_changed {
            subscription.set_window(new_from, new_until, now)?;
        }

        // 2. Status change through the state machine
        if let Some(status) = cmd.status {
            if status != subscription.status {
                subscription.set_status(status, now)?;
            }
        }

        // 3. Payment fields
        if let Some(amount) = cmd.amount_paid_cents {
            subscription.amount_paid_cents = amount;
            subscription.updated_at = now;
        }
        if let Some(paid_at) = cmd.paid_at {
            subscription.paid_at = paid_at;
            subscription.updated_at = now;
        }
        if let Some(method) = cmd.payment_method {
            subscription.payment_method = Some(method);
            subscription.updated_at = now;
        }

        // 4. Persist; a moved window end propagates to the grants
        let rewrite_until = until_changed.then_some(new_until);
        self.store
            .update_with_rewrite(&subscription, rewrite_until)
            .await?;

        Ok(UpdateSubscriptionResult { subscription })
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
    use crate::ports::FixedClock;

    fn day(m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd(2025, m, d).unwrap()
    }

    fn seed(store: &InMemoryStore) -> SubscriptionId {
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
        let id = sub.id;
        store.seed_grant(AccessGrant::new(
            AccessGrantId::new(),
            sub.client_id,
            ServiceId::new(),
            Some(id),
            AccessWindow::bounded(day(1, 1), day(1, 31)).unwrap(),
            day(1, 1),
        ));
        store.seed_subscription(sub);
        id
    }

    fn handler(store: &Arc<InMemoryStore>, now: Timestamp) -> UpdateSubscriptionHandler {
        UpdateSubscriptionHandler::new(store.clone(), store.clone(), Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn extending_window_rewrites_grants() {
        let store = Arc::new(InMemoryStore::new());
        let id = seed(&store);

        let result = handler(&store, day(1, 10))
            .handle(UpdateSubscriptionCommand {
                subscription_id: id,
                valid_until: Some(day(2, 15)),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.subscription.valid_until, day(2, 15));
        assert_eq!(store.all_grants()[0].window.until(), Some(day(2, 15)));
    }

    #[tokio::test]
    async fn shortening_window_rewrites_grants() {
        let store = Arc::new(InMemoryStore::new());
        let id = seed(&store);

        handler(&store, day(1, 10))
            .handle(UpdateSubscriptionCommand {
                subscription_id: id,
                valid_until: Some(day(1, 20)),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(store.all_grants()[0].window.until(), Some(day(1, 20)));
    }

    #[tokio::test]
    async fn unchanged_window_leaves_grants_alone() {
        let store = Arc::new(InMemoryStore::new());
        let id = seed(&store);

        handler(&store, day(1, 10))
            .handle(UpdateSubscriptionCommand {
                subscription_id: id,
                amount_paid_cents: Some(5000),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(store.all_grants()[0].window.until(), Some(day(1, 31)));
        let sub = store.all_subscriptions().pop().unwrap();
        assert_eq!(sub.amount_paid_cents, 5000);
    }

    #[tokio::test]
    async fn rejects_inverted_window() {
        let store = Arc::new(InMemoryStore::new());
        let id = seed(&store);

        let err = handler(&store, day(1, 10))
            .handle(UpdateSubscriptionCommand {
                subscription_id: id,
                valid_from: Some(day(2, 10)),
                valid_until: Some(day(2, 1)),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidWindow);
        // Nothing persisted.
        let sub = store.all_subscriptions().pop().unwrap();
        assert_eq!(sub.valid_until, day(1, 31));
    }

    #[tokio::test]
    async fn rejects_invalid_status_transition() {
        let store = Arc::new(InMemoryStore::new());
        let id = seed(&store);

        let mut sub = store.all_subscriptions().pop().unwrap();
        sub.expire(day(2, 1)).unwrap();
        store.seed_subscription(sub);

        let err = handler(&store, day(2, 2))
            .handle(UpdateSubscriptionCommand {
                subscription_id: id,
                status: Some(SubscriptionStatus::Active),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn fails_for_unknown_subscription() {
        let store = Arc::new(InMemoryStore::new());

        let err = handler(&store, day(1, 10))
            .handle(UpdateSubscriptionCommand {
                subscription_id: SubscriptionId::new(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }
}
