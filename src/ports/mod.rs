//! Ports - contracts between the application core and the outside world.
//!
//! All storage access goes through these async traits; adapters provide the
//! postgres and in-memory implementations. No in-process caching of
//! subscription or grant state is permitted behind them: every check reads
//! fresh.

mod access_grant_repository;
mod catalog_repositories;
mod clock;
mod subscription_repository;
mod subscription_store;
mod type_service_repository;

pub use access_grant_repository::AccessGrantRepository;
pub use catalog_repositories::{ClientRepository, ServiceRepository, SubscriptionTypeRepository};
pub use clock::{Clock, FixedClock, SystemClock};
pub use subscription_repository::{SubscriptionFilter, SubscriptionRepository};
pub use subscription_store::SubscriptionStore;
pub use type_service_repository::TypeServiceRepository;
