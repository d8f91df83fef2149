//! SweepExpiredHandler - the idempotent expiration sweep.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::ports::{Clock, SubscriptionRepository};

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Subscriptions transitioned to Expired.
    pub swept: u64,
    /// Rows that could not be transitioned or persisted this pass; they
    /// stay in the work list and the next pass retries them.
    pub failed: u64,
}

/// Handler marking lapsed subscriptions Expired.
///
/// Reads the fresh work list (active-bucket rows with `valid_until < now`)
/// and transitions each row individually, so a pass that finds nothing
/// writes nothing and a second pass over the same instant is a no-op.
/// Grants are left alone: their windows lapse by the same calendar and the
/// access decision point already denies them.
pub struct SweepExpiredHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
}

impl SweepExpiredHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            subscriptions,
            clock,
        }
    }

    pub async fn handle(&self) -> Result<SweepReport, DomainError> {
        let now = self.clock.now();
        let lapsed = self.subscriptions.find_expired_active(now).await?;
        if lapsed.is_empty() {
            tracing::debug!("expiration sweep found nothing to do");
            return Ok(SweepReport::default());
        }

        let mut report = SweepReport::default();
        for mut subscription in lapsed {
            let id = subscription.id;
            // Per-row isolation: one bad row must not block the rest.
            let outcome = match subscription.expire(now) {
                Ok(()) => self.subscriptions.update(&subscription).await,
                Err(err) => Err(err),
            };
            match outcome {
                Ok(()) => report.swept += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(subscription_id = %id, error = %err, "sweep skipped row");
                }
            }
        }

        tracing::info!(swept = report.swept, failed = report.failed, "expiration sweep done");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryStore;
    use crate::domain::foundation::{
        ClientId, PriceTierId, SubscriptionId, SubscriptionTypeId, Timestamp,
    };
    use crate::domain::subscription::{Subscription, SubscriptionStatus};
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

    fn handler(store: &Arc<InMemoryStore>, now: Timestamp) -> SweepExpiredHandler {
        SweepExpiredHandler::new(store.clone(), Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn sweeps_only_lapsed_active_rows() {
        let store = Arc::new(InMemoryStore::new());
        let lapsed = seed(&store, SubscriptionStatus::Active, day(1, 31));
        let running = seed(&store, SubscriptionStatus::Active, day(3, 31));
        let cancelled = seed(&store, SubscriptionStatus::Cancelled, day(1, 15));

        let report = handler(&store, day(2, 1)).handle().await.unwrap();
        assert_eq!(report, SweepReport { swept: 1, failed: 0 });

        let by_id = |id: SubscriptionId| {
            store
                .all_subscriptions()
                .into_iter()
                .find(|s| s.id == id)
                .unwrap()
        };
        assert_eq!(by_id(lapsed).status, SubscriptionStatus::Expired);
        assert_eq!(by_id(running).status, SubscriptionStatus::Active);
        assert_eq!(by_id(cancelled).status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn window_end_day_is_not_yet_lapsed() {
        let store = Arc::new(InMemoryStore::new());
        let id = seed(&store, SubscriptionStatus::Active, day(1, 31));

        let report = handler(&store, day(1, 31)).handle().await.unwrap();
        assert_eq!(report.swept, 0);
        assert_eq!(
            store
                .all_subscriptions()
                .into_iter()
                .find(|s| s.id == id)
                .unwrap()
                .status,
            SubscriptionStatus::Active
        );
    }

    #[tokio::test]
    async fn second_pass_is_a_noop() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, SubscriptionStatus::Active, day(1, 31));
        let h = handler(&store, day(2, 1));

        assert_eq!(h.handle().await.unwrap().swept, 1);
        assert_eq!(h.handle().await.unwrap(), SweepReport::default());
    }

    #[tokio::test]
    async fn grants_are_left_untouched() {
        use crate::domain::access::AccessGrant;
        use crate::domain::foundation::{AccessGrantId, AccessWindow, ServiceId};

        let store = Arc::new(InMemoryStore::new());
        let id = seed(&store, SubscriptionStatus::Active, day(1, 31));
        store.seed_grant(AccessGrant::new(
            AccessGrantId::new(),
            ClientId::new(),
            ServiceId::new(),
            Some(id),
            AccessWindow::bounded(day(1, 1), day(1, 31)).unwrap(),
            day(1, 1),
        ));

        handler(&store, day(2, 1)).handle().await.unwrap();

        let grant = store.all_grants().pop().unwrap();
        assert_eq!(grant.window.until(), Some(day(1, 31)));
    }

    #[tokio::test]
    async fn pending_rows_are_not_swept() {
        let store = Arc::new(InMemoryStore::new());
        let id = seed(&store, SubscriptionStatus::Pending, day(1, 31));

        let report = handler(&store, day(2, 1)).handle().await.unwrap();
        assert_eq!(report.swept, 0);
        assert_eq!(
            store
                .all_subscriptions()
                .into_iter()
                .find(|s| s.id == id)
                .unwrap()
                .status,
            SubscriptionStatus::Pending
        );
    }
}
