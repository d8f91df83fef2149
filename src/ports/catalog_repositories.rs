//! Catalog repository ports - read access to reference entities.
//!
//! The engine only validates against these records; their CRUD surface is an
//! external collaborator and stays out of these traits.

use async_trait::async_trait;

use crate::domain::catalog::{Client, PriceTier, Service, SubscriptionType};
use crate::domain::foundation::{
    ClientId, DomainError, PriceTierId, ServiceId, SubscriptionTypeId,
};

/// Lookup port for clients.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Find a client by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &ClientId) -> Result<Option<Client>, DomainError>;
}

/// Lookup port for services.
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// Find a service by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &ServiceId) -> Result<Option<Service>, DomainError>;

    /// Find all services with the given ids.
    ///
    /// The result may be shorter than the input when some ids do not exist;
    /// callers compare lengths to detect missing references.
    async fn find_by_ids(&self, ids: &[ServiceId]) -> Result<Vec<Service>, DomainError>;
}

/// Lookup port for subscription types and their price tiers.
#[async_trait]
pub trait SubscriptionTypeRepository: Send + Sync {
    /// Find a subscription type by id. Returns `None` if not found.
    async fn find_by_id(
        &self,
        id: &SubscriptionTypeId,
    ) -> Result<Option<SubscriptionType>, DomainError>;

    /// Find a price tier by id. Returns `None` if not found.
    async fn find_tier(&self, id: &PriceTierId) -> Result<Option<PriceTier>, DomainError>;
}
