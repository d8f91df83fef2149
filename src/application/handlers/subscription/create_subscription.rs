//! CreateSubscriptionHandler - purchase of a subscription with cascading
//! access provisioning.

use std::sync::Arc;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{
    AccessGrantId, AccessWindow, ClientId, DomainError, ErrorCode, PriceTierId, SubscriptionId,
    SubscriptionTypeId, Timestamp,
};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{
    ClientRepository, Clock, SubscriptionStore, SubscriptionTypeRepository, TypeServiceRepository,
};

/// Command to purchase a subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub client_id: ClientId,
    pub type_id: SubscriptionTypeId,
    pub tier_id: PriceTierId,
    /// Start of validity; defaults to now.
    pub valid_from: Option<Timestamp>,
    /// Amount actually paid; defaults to the tier price.
    pub amount_paid_cents: Option<i64>,
    /// Payment instant; defaults to now.
    pub paid_at: Option<Timestamp>,
    pub payment_method: Option<String>,
}

/// Result of a successful purchase.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionResult {
    pub subscription: Subscription,
    /// Grants provisioned by the cascade; pairs that already had a grant
    /// were skipped.
    pub grants_created: u64,
}

/// Handler for subscription purchase.
///
/// The validity window is derived from the tier (`valid_from` plus the
/// tier's duration, endpoints inclusive), then one grant per enabled service
/// in the type's service set is provisioned over that same window. The
/// subscription insert and the grant inserts commit together.
pub struct CreateSubscriptionHandler {
    clients: Arc<dyn ClientRepository>,
    types: Arc<dyn SubscriptionTypeRepository>,
    associations: Arc<dyn TypeServiceRepository>,
    store: Arc<dyn SubscriptionStore>,
    clock: Arc<dyn Clock>,
}

impl CreateSubscriptionHandler {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        types: Arc<dyn SubscriptionTypeRepository>,
        associations: Arc<dyn TypeServiceRepository>,
        store: Arc<dyn SubscriptionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            clients,
            types,
            associations,
            store,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<CreateSubscriptionResult, DomainError> {
        let now = self.clock.now();

        // 1. Client must exist and be enabled
        let client = self
            .clients
            .find_by_id(&cmd.client_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(ErrorCode::ClientNotFound, "Client", cmd.client_id)
            })?;
        if !client.enabled {
            return Err(DomainError::validation(
                "client_id",
                format!("Client {} is disabled", cmd.client_id),
            ));
        }

        // 2. Type must exist, tier must exist and belong to the type
        self.types.find_by_id(&cmd.type_id).await?.ok_or_else(|| {
            DomainError::not_found(ErrorCode::TypeNotFound, "Subscription type", cmd.type_id)
        })?;
        let tier = self.types.find_tier(&cmd.tier_id).await?.ok_or_else(|| {
            DomainError::not_found(ErrorCode::TierNotFound, "Price tier", cmd.tier_id)
        })?;
        if tier.type_id != cmd.type_id {
            return Err(DomainError::new(
                ErrorCode::TierNotFound,
                format!(
                    "Price tier {} does not belong to subscription type {}",
                    cmd.tier_id, cmd.type_id
                ),
            ));
        }

        // 3. Derive the window from the tier
        let valid_from = cmd.valid_from.unwrap_or(now);
        let valid_until = tier.period_end(valid_from);
        let subscription = Subscription::new(
            SubscriptionId::new(),
            cmd.client_id,
            cmd.type_id,
            cmd.tier_id,
            valid_from,
            valid_until,
            cmd.amount_paid_cents.unwrap_or(tier.price_cents),
            cmd.paid_at.unwrap_or(now),
            SubscriptionStatus::Active,
            cmd.payment_method,
            now,
        )?;

        // 4. One grant per enabled associated service, over the same window
        let window = AccessWindow::bounded(valid_from, valid_until)?;
        let grants: Vec<AccessGrant> = self
            .associations
            .services_for(&cmd.type_id)
            .await?
            .into_iter()
            .filter(|service| service.enabled)
            .map(|service| {
                AccessGrant::new(
                    AccessGrantId::new(),
                    cmd.client_id,
                    service.id,
                    Some(subscription.id),
                    window.clone(),
                    now,
                )
            })
            .collect();

        // 5. Commit the cascade in one transaction
        let grants_created = self.store.create_with_grants(&subscription, &grants).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            client_id = %cmd.client_id,
            grants_created,
            "subscription created"
        );

        Ok(CreateSubscriptionResult {
            subscription,
            grants_created,
        })
    }
}
