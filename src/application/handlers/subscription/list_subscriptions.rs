//! ListSubscriptionsHandler - filtered subscription listing.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::subscription::Subscription;
use crate::ports::{SubscriptionFilter, SubscriptionRepository};

#[derive(Debug, Clone, Default)]
pub struct ListSubscriptionsCommand {
    pub filter: SubscriptionFilter,
}

#[derive(Debug, Clone)]
pub struct ListSubscriptionsResult {
    pub subscriptions: Vec<Subscription>,
}

pub struct ListSubscriptionsHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl ListSubscriptionsHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        cmd: ListSubscriptionsCommand,
    ) -> Result<ListSubscriptionsResult, DomainError> {
        let subscriptions = self.subscriptions.list(&cmd.filter).await?;
        Ok(ListSubscriptionsResult { subscriptions })
    }
}
