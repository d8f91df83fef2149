//! PostgreSQL adapters - persistent implementations of the storage ports.

mod access_grant_repository;
mod client_repository;
mod service_repository;
mod subscription_repository;
mod subscription_store;
mod subscription_type_repository;
mod type_service_repository;

pub use access_grant_repository::PostgresAccessGrantRepository;
pub use client_repository::PostgresClientRepository;
pub use service_repository::PostgresServiceRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use subscription_store::PostgresSubscriptionStore;
pub use subscription_type_repository::PostgresSubscriptionTypeRepository;
pub use type_service_repository::PostgresTypeServiceRepository;
