//! RenewSubscriptionHandler - chained renewal of a subscription.

use std::sync::Arc;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{
    AccessGrantId, AccessWindow, DomainError, ErrorCode, PriceTierId, SubscriptionId, Timestamp,
};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{
    AccessGrantRepository, ClientRepository, Clock, SubscriptionRepository, SubscriptionStore,
    SubscriptionTypeRepository, TypeServiceRepository,
};

/// Command to renew an existing subscription.
#[derive(Debug, Clone)]
pub struct RenewSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    /// Start of the new period; defaults to the day after the prior
    /// window ends.
    pub valid_from: Option<Timestamp>,
    /// Tier for the new period; defaults to the prior subscription's tier.
    pub tier_id: Option<PriceTierId>,
    /// Amount actually paid; defaults to the tier price.
    pub amount_paid_cents: Option<i64>,
    /// Payment instant; defaults to now.
    pub paid_at: Option<Timestamp>,
    pub payment_method: Option<String>,
}

/// Result of a successful renewal.
#[derive(Debug, Clone)]
pub struct RenewSubscriptionResult {
    pub subscription: Subscription,
    /// Grants of the prior subscription whose end moved to the new window end.
    pub grants_extended: u64,
    /// Grants freshly provisioned for services associated since the prior
    /// purchase.
    pub grants_created: u64,
}

/// Handler for renewal.
///
/// Renewal never mutates the prior row. It creates a new subscription
/// starting the day after the prior window ends (or at the caller-supplied
/// start), running one tier duration from there. Grants provisioned by the prior subscription get their end
/// rewritten to the new window end; services associated with the type since
/// then get fresh grants referencing the new subscription. The whole
/// cascade commits in one transaction.
pub struct RenewSubscriptionHandler {
    clients: Arc<dyn ClientRepository>,
    types: Arc<dyn SubscriptionTypeRepository>,
    associations: Arc<dyn TypeServiceRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    grants: Arc<dyn AccessGrantRepository>,
    store: Arc<dyn SubscriptionStore>,
    clock: Arc<dyn Clock>,
}

impl RenewSubscriptionHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        types: Arc<dyn SubscriptionTypeRepository>,
        associations: Arc<dyn TypeServiceRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        grants: Arc<dyn AccessGrantRepository>,
        store: Arc<dyn SubscriptionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            clients,
            types,
            associations,
            subscriptions,
            grants,
            store,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: RenewSubscriptionCommand,
    ) -> Result<RenewSubscriptionResult, DomainError> {
        let now = self.clock.now();

        // 1. Prior subscription must exist
        let prior = self
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

        // 2. Its client must still be enabled
        let client = self
            .clients
            .find_by_id(&prior.client_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(ErrorCode::ClientNotFound, "Client", prior.client_id)
            })?;
        if !client.enabled {
            return Err(DomainError::validation(
                "client_id",
                format!("Client {} is disabled", prior.client_id),
            ));
        }

        // 3. Resolve the tier for the new period
        let tier_id = cmd.tier_id.unwrap_or(prior.tier_id);
        let tier = self.types.find_tier(&tier_id).await?.ok_or_else(|| {
            DomainError::not_found(ErrorCode::TierNotFound, "Price tier", tier_id)
        })?;
        if tier.type_id != prior.type_id {
            return Err(DomainError::new(
                ErrorCode::TierNotFound,
                format!(
                    "Price tier {} does not belong to subscription type {}",
                    tier_id, prior.type_id
                ),
            ));
        }

        // 4. New window chains from the prior one unless overridden
        let valid_from = cmd.valid_from.unwrap_or_else(|| prior.renewal_start());
        let valid_until = tier.period_end(valid_from);
        let subscription = Subscription::new(
            SubscriptionId::new(),
            prior.client_id,
            prior.type_id,
            tier_id,
            valid_from,
            valid_until,
            cmd.amount_paid_cents.unwrap_or(tier.price_cents),
            cmd.paid_at.unwrap_or(now),
            SubscriptionStatus::Active,
            cmd.payment_method,
            now,
        )?;

        // 5. Fresh grants for enabled services the client has no grant for;
        //    window covers the full renewed period
        let window = AccessWindow::bounded(valid_from, valid_until)?;
        let mut fresh_grants = Vec::new();
        for service in self.associations.services_for(&prior.type_id).await? {
            if !service.enabled {
                continue;
            }
            let existing = self.grants.find_pair(&prior.client_id, &service.id).await?;
            if existing.is_none() {
                fresh_grants.push(AccessGrant::new(
                    AccessGrantId::new(),
                    prior.client_id,
                    service.id,
                    Some(subscription.id),
                    window.clone(),
                    now,
                ));
            }
        }

        // 6. Commit: insert the new row, extend the prior row's grants to
        //    the new window end, provision the fresh grants
        let (grants_extended, grants_created) = self
            .store
            .renew_with_grants(&subscription, &prior.id, &fresh_grants, valid_until)
            .await?;

        tracing::info!(
            subscription_id = %subscription.id,
            prior_id = %prior.id,
            grants_extended,
            grants_created,
            "subscription renewed"
        );

        Ok(RenewSubscriptionResult {
            subscription,
            grants_extended,
            grants_created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryStore;
    use crate::domain::catalog::{Client, PriceTier, Service, SubscriptionType};
    use crate::domain::foundation::{ClientId, ServiceId, SubscriptionTypeId};
    use crate::ports::FixedClock;

    fn day(m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd(2025, m, d).unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        client_id: ClientId,
        type_id: SubscriptionTypeId,
        tier_id: PriceTierId,
        pool: ServiceId,
        prior_id: SubscriptionId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());

        let client = Client::new(
            ClientId::new(),
            "Nadia",
            "Benali",
            "+33600000001",
            None,
            day(1, 1),
        )
        .unwrap();
        let client_id = client.id;
        store.seed_client(client);

        let t = SubscriptionType::new(SubscriptionTypeId::new(), "Full access", None).unwrap();
        let type_id = t.id;
        store.seed_type(t);

        let tier = PriceTier::new(PriceTierId::new(), type_id, 30, 4500, None).unwrap();
        let tier_id = tier.id;
        store.seed_tier(tier);

        let pool_svc = Service::new(ServiceId::new(), "Pool", None).unwrap();
        let pool = pool_svc.id;
        store.seed_association(type_id, pool);
        store.seed_service(pool_svc);

        // Prior subscription: Jan 1 - Jan 31, with its pool grant.
        let prior = Subscription::new(
            SubscriptionId::new(),
            client_id,
            type_id,
            tier_id,
            day(1, 1),
            day(1, 31),
            4500,
            day(1, 1),
            SubscriptionStatus::Active,
            None,
            day(1, 1),
        )
        .unwrap();
        let prior_id = prior.id;
        store.seed_grant(AccessGrant::new(
            AccessGrantId::new(),
            client_id,
            pool,
            Some(prior_id),
            AccessWindow::bounded(day(1, 1), day(1, 31)).unwrap(),
            day(1, 1),
        ));
        store.seed_subscription(prior);

        Fixture {
            store,
            client_id,
            type_id,
            tier_id,
            pool,
            prior_id,
        }
    }

    fn handler(f: &Fixture, now: Timestamp) -> RenewSubscriptionHandler {
        RenewSubscriptionHandler::new(
            f.store.clone(),
            f.store.clone(),
            f.store.clone(),
            f.store.clone(),
            f.store.clone(),
            f.store.clone(),
            Arc::new(FixedClock(now)),
        )
    }

    fn command(f: &Fixture) -> RenewSubscriptionCommand {
        RenewSubscriptionCommand {
            subscription_id: f.prior_id,
            valid_from: None,
            tier_id: None,
            amount_paid_cents: None,
            paid_at: None,
            payment_method: Some("card".to_string()),
        }
    }

    #[tokio::test]
    async fn new_window_chains_from_prior_end() {
        let f = fixture();
        let result = handler(&f, day(1, 28)).handle(command(&f)).await.unwrap();

        assert_eq!(result.subscription.valid_from, day(2, 1));
        assert_eq!(result.subscription.valid_until, day(3, 3));
        assert_ne!(result.subscription.id, f.prior_id);
        // Prior row untouched.
        let prior = f
            .store
            .all_subscriptions()
            .into_iter()
            .find(|s| s.id == f.prior_id)
            .unwrap();
        assert_eq!(prior.valid_until, day(1, 31));
    }

    #[tokio::test]
    async fn extends_prior_grants_to_new_end() {
        let f = fixture();
        let result = handler(&f, day(1, 28)).handle(command(&f)).await.unwrap();

        assert_eq!(result.grants_extended, 1);
        assert_eq!(result.grants_created, 0);
        let grant = f.store.all_grants().pop().unwrap();
        assert_eq!(grant.window.until(), Some(day(3, 3)));
        // Still referencing the prior subscription.
        assert_eq!(grant.subscription_id, Some(f.prior_id));
    }

    #[tokio::test]
    async fn provisions_services_associated_since_purchase() {
        let f = fixture();
        let climbing = Service::new(ServiceId::new(), "Climbing", None).unwrap();
        let climbing_id = climbing.id;
        f.store.seed_association(f.type_id, climbing_id);
        f.store.seed_service(climbing);

        let result = handler(&f, day(1, 28)).handle(command(&f)).await.unwrap();

        assert_eq!(result.grants_extended, 1);
        assert_eq!(result.grants_created, 1);
        let fresh = f
            .store
            .all_grants()
            .into_iter()
            .find(|g| g.service_id == climbing_id)
            .unwrap();
        assert_eq!(fresh.subscription_id, Some(result.subscription.id));
        assert_eq!(fresh.window.from(), day(2, 1));
        assert_eq!(fresh.window.until(), Some(day(3, 3)));
    }

    #[tokio::test]
    async fn explicit_start_overrides_the_chained_window() {
        let f = fixture();
        let mut cmd = command(&f);
        cmd.valid_from = Some(day(2, 15));

        let result = handler(&f, day(1, 28)).handle(cmd).await.unwrap();
        assert_eq!(result.subscription.valid_from, day(2, 15));
        assert_eq!(result.subscription.valid_until, day(3, 17));
        // Grants follow the overridden window end.
        let grant = f.store.all_grants().pop().unwrap();
        assert_eq!(grant.window.until(), Some(day(3, 17)));
    }

    #[tokio::test]
    async fn renewal_with_different_tier_uses_its_duration() {
        let f = fixture();
        let quarterly = PriceTier::new(PriceTierId::new(), f.type_id, 90, 11900, None).unwrap();
        let quarterly_id = quarterly.id;
        f.store.seed_tier(quarterly);

        let mut cmd = command(&f);
        cmd.tier_id = Some(quarterly_id);

        let result = handler(&f, day(1, 28)).handle(cmd).await.unwrap();
        assert_eq!(result.subscription.valid_from, day(2, 1));
        assert_eq!(result.subscription.valid_until, day(5, 2));
        assert_eq!(result.subscription.amount_paid_cents, 11900);
    }

    #[tokio::test]
    async fn chained_renewal_renews_the_latest_row() {
        let f = fixture();
        let first = handler(&f, day(1, 28)).handle(command(&f)).await.unwrap();

        let mut cmd = command(&f);
        cmd.subscription_id = first.subscription.id;
        let second = handler(&f, day(2, 25)).handle(cmd).await.unwrap();

        assert_eq!(second.subscription.valid_from, day(3, 4));
        assert_eq!(second.subscription.valid_until, day(4, 3));
        assert_eq!(f.store.all_subscriptions().len(), 3);
    }

    #[tokio::test]
    async fn fails_for_unknown_subscription() {
        let f = fixture();
        let mut cmd = command(&f);
        cmd.subscription_id = SubscriptionId::new();

        let err = handler(&f, day(1, 28)).handle(cmd).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }

    #[tokio::test]
    async fn fails_for_tier_of_another_type() {
        let f = fixture();
        let other = SubscriptionType::new(SubscriptionTypeId::new(), "Aqua only", None).unwrap();
        let foreign = PriceTier::new(PriceTierId::new(), other.id, 30, 2500, None).unwrap();
        let foreign_id = foreign.id;
        f.store.seed_type(other);
        f.store.seed_tier(foreign);

        let mut cmd = command(&f);
        cmd.tier_id = Some(foreign_id);

        let err = handler(&f, day(1, 28)).handle(cmd).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TierNotFound);
    }

    #[tokio::test]
    async fn grant_shared_with_other_source_is_not_duplicated() {
        let f = fixture();
        // The pool grant exists but was issued directly, not by the prior
        // subscription.
        let mut grants = f.store.all_grants();
        let mut grant = grants.pop().unwrap();
        grant.subscription_id = None;
        f.store.seed_grant(grant);

        let result = handler(&f, day(1, 28)).handle(command(&f)).await.unwrap();
        // Nothing referenced the prior row, and the (client, pool) pair
        // already exists, so neither extension nor creation happens.
        assert_eq!(result.grants_extended, 0);
        assert_eq!(result.grants_created, 0);
        assert_eq!(f.store.all_grants().len(), 1);
        assert_eq!(f.store.all_grants()[0].window.until(), Some(day(1, 31)));
    }

    #[tokio::test]
    async fn renewing_expired_subscription_is_allowed() {
        let f = fixture();
        let mut prior = f
            .store
            .all_subscriptions()
            .into_iter()
            .find(|s| s.id == f.prior_id)
            .unwrap();
        prior.expire(day(2, 1)).unwrap();
        f.store.seed_subscription(prior);

        let result = handler(&f, day(2, 10)).handle(command(&f)).await.unwrap();
        assert_eq!(result.subscription.valid_from, day(2, 1));
        let grant = f
            .store
            .all_grants()
            .into_iter()
            .find(|g| g.service_id == f.pool)
            .unwrap();
        assert_eq!(grant.window.until(), Some(day(3, 3)));
    }
}
