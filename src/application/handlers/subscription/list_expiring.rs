//! ListExpiringHandler - subscriptions approaching their window end.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::subscription::Subscription;
use crate::ports::{Clock, SubscriptionRepository};

/// Command listing running subscriptions that end within `days` of now.
#[derive(Debug, Clone)]
pub struct ListExpiringCommand {
    pub days: i64,
}

#[derive(Debug, Clone)]
pub struct ListExpiringResult {
    pub subscriptions: Vec<Subscription>,
}

/// Renewal-reminder listing: active subscriptions whose window ends within
/// the horizon, soonest first. Already-lapsed rows belong to the sweeper,
/// not this list.
pub struct ListExpiringHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
}

impl ListExpiringHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            subscriptions,
            clock,
        }
    }

    pub async fn handle(&self, cmd: ListExpiringCommand) -> Result<ListExpiringResult, DomainError> {
        if cmd.days <= 0 {
            return Err(DomainError::validation(
                "days",
                format!("Horizon must be positive, got {}", cmd.days),
            ));
        }
        let now = self.clock.now();
        let subscriptions = self
            .subscriptions
            .find_expiring_within(now, cmd.days)
            .await?;
        Ok(ListExpiringResult { subscriptions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryStore;
    use crate::domain::foundation::{
        ClientId, ErrorCode, PriceTierId, SubscriptionId, SubscriptionTypeId, Timestamp,
    };
    use crate::domain::subscription::SubscriptionStatus;
    use crate::ports::FixedClock;

    fn day(m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd(2025, m, d).unwrap()
    }

    fn seed(store: &InMemoryStore, status: SubscriptionStatus, until: Timestamp) -> SubscriptionId {
        let sub = Subscription::new(
            SubscriptionId::new(),
            ClientId::new(),
            SubscriptionTypeId::new(),
            PriceTierId::new(),
            day(1, 1),
            until,
            4500,
            day(1, 1),
            status,
            None,
            day(1, 1),
        )
        .unwrap();
        let id = sub.id;
        store.seed_subscription(sub);
        id
    }

    fn handler(store: &Arc<InMemoryStore>, now: Timestamp) -> ListExpiringHandler {
        ListExpiringHandler::new(store.clone(), Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn lists_only_within_horizon_soonest_first() {
        let store = Arc::new(InMemoryStore::new());
        let soon = seed(&store, SubscriptionStatus::Active, day(1, 20));
        let sooner = seed(&store, SubscriptionStatus::Active, day(1, 17));
        seed(&store, SubscriptionStatus::Active, day(3, 1));
        seed(&store, SubscriptionStatus::Cancelled, day(1, 18));
        // Already lapsed: belongs to the sweeper.
        seed(&store, SubscriptionStatus::Active, day(1, 10));

        let result = handler(&store, day(1, 15))
            .handle(ListExpiringCommand { days: 7 })
            .await
            .unwrap();

        let ids: Vec<_> = result.subscriptions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![sooner, soon]);
    }

    #[tokio::test]
    async fn rejects_non_positive_horizon() {
        let store = Arc::new(InMemoryStore::new());

        let err = handler(&store, day(1, 15))
            .handle(ListExpiringCommand { days: 0 })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
