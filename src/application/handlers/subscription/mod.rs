//! Subscription lifecycle handlers - purchase, renewal, edits, termination,
//! listings, and the expiration sweeper.

mod create_subscription;
mod get_subscription;
mod list_expiring;
mod list_subscriptions;
mod remove_subscription;
mod renew_subscription;
mod sweep_expired;
mod terminate_subscription;
mod update_subscription;

pub use create_subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
};
pub use get_subscription::{GetSubscriptionCommand, GetSubscriptionHandler, GetSubscriptionResult};
pub use list_expiring::{ListExpiringCommand, ListExpiringHandler, ListExpiringResult};
pub use list_subscriptions::{
    ListSubscriptionsCommand, ListSubscriptionsHandler, ListSubscriptionsResult,
};
pub use remove_subscription::{
    RemoveSubscriptionCommand, RemoveSubscriptionHandler, RemoveSubscriptionResult,
};
pub use renew_subscription::{
    RenewSubscriptionCommand, RenewSubscriptionHandler, RenewSubscriptionResult,
};
pub use sweep_expired::{SweepExpiredHandler, SweepReport};
pub use terminate_subscription::{
    TerminateSubscriptionCommand, TerminateSubscriptionHandler, TerminateSubscriptionResult,
};
pub use update_subscription::{
    UpdateSubscriptionCommand, UpdateSubscriptionHandler, UpdateSubscriptionResult,
};
