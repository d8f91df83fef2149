//! GetSubscriptionHandler - detail view of a subscription and its grants.

use std::sync::Arc;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId};
use crate::domain::subscription::Subscription;
use crate::ports::{AccessGrantRepository, SubscriptionRepository};

#[derive(Debug, Clone)]
pub struct GetSubscriptionCommand {
    pub subscription_id: SubscriptionId,
}

#[derive(Debug, Clone)]
pub struct GetSubscriptionResult {
    pub subscription: Subscription,
    /// Grants this subscription provisioned.
    pub grants: Vec<AccessGrant>,
}

pub struct GetSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    grants: Arc<dyn AccessGrantRepository>,
}

impl GetSubscriptionHandler {
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
        cmd: GetSubscriptionCommand,
    ) -> Result<GetSubscriptionResult, DomainError> {
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
        let grants = self.grants.find_by_subscription(&subscription.id).await?;

        Ok(GetSubscriptionResult {
            subscription,
            grants,
        })
    }
}
