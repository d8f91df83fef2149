//! In-memory store implementation for testing.
//!
//! Implements every storage port over locked hash maps with synchronous,
//! deterministic behavior. Multi-row cascades hold the relevant locks for
//! the whole write, which stands in for the storage transaction.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in
//! production. It uses `.expect()` on lock operations which will panic if
//! locks are poisoned. Production code uses the postgres adapters.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::access::AccessGrant;
use crate::domain::catalog::{
    Client, PriceTier, Service, SubscriptionType, TypeServiceAssociation,
};
use crate::domain::foundation::{
    AccessGrantId, ClientId, DomainError, ErrorCode, PriceTierId, ServiceId, SubscriptionId,
    SubscriptionTypeId, Timestamp,
};
use crate::domain::subscription::{StatusBucket, Subscription};
use crate::ports::{
    AccessGrantRepository, ClientRepository, ServiceRepository, SubscriptionFilter,
    SubscriptionRepository, SubscriptionStore, SubscriptionTypeRepository, TypeServiceRepository,
};

/// In-memory implementation of all storage ports.
#[derive(Default)]
pub struct InMemoryStore {
    clients: RwLock<HashMap<ClientId, Client>>,
    services: RwLock<HashMap<ServiceId, Service>>,
    types: RwLock<HashMap<SubscriptionTypeId, SubscriptionType>>,
    tiers: RwLock<HashMap<PriceTierId, PriceTier>>,
    associations: RwLock<Vec<TypeServiceAssociation>>,
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    grants: RwLock<HashMap<AccessGrantId, AccessGrant>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Seed helpers ===

    pub fn seed_client(&self, client: Client) {
        self.clients
            .write()
            .expect("clients lock poisoned")
            .insert(client.id, client);
    }

    pub fn seed_service(&self, service: Service) {
        self.services
            .write()
            .expect("services lock poisoned")
            .insert(service.id, service);
    }

    pub fn seed_type(&self, subscription_type: SubscriptionType) {
        self.types
            .write()
            .expect("types lock poisoned")
            .insert(subscription_type.id, subscription_type);
    }

    pub fn seed_tier(&self, tier: PriceTier) {
        self.tiers
            .write()
            .expect("tiers lock poisoned")
            .insert(tier.id, tier);
    }

    pub fn seed_association(&self, type_id: SubscriptionTypeId, service_id: ServiceId) {
        let mut associations = self.associations.write().expect("associations lock poisoned");
        if !associations
            .iter()
            .any(|a| a.type_id == type_id && a.service_id == service_id)
        {
            associations.push(TypeServiceAssociation { type_id, service_id });
        }
    }

    pub fn seed_subscription(&self, subscription: Subscription) {
        self.subscriptions
            .write()
            .expect("subscriptions lock poisoned")
            .insert(subscription.id, subscription);
    }

    pub fn seed_grant(&self, grant: AccessGrant) {
        self.grants
            .write()
            .expect("grants lock poisoned")
            .insert(grant.id, grant);
    }

    // === Test assertion helpers ===

    /// Snapshot of all grants.
    pub fn all_grants(&self) -> Vec<AccessGrant> {
        self.grants
            .read()
            .expect("grants lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Snapshot of all subscriptions.
    pub fn all_subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions
            .read()
            .expect("subscriptions lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Snapshot of all association rows.
    pub fn all_associations(&self) -> Vec<TypeServiceAssociation> {
        self.associations
            .read()
            .expect("associations lock poisoned")
            .clone()
    }

    fn service_name(&self, id: &ServiceId) -> String {
        self.services
            .read()
            .expect("services lock poisoned")
            .get(id)
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }

    fn client_name(&self, id: &ClientId) -> String {
        self.clients
            .read()
            .expect("clients lock poisoned")
            .get(id)
            .map(|c| c.full_name())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ClientRepository for InMemoryStore {
    async fn find_by_id(&self, id: &ClientId) -> Result<Option<Client>, DomainError> {
        Ok(self
            .clients
            .read()
            .expect("clients lock poisoned")
            .get(id)
            .cloned())
    }
}

#[async_trait]
impl ServiceRepository for InMemoryStore {
    async fn find_by_id(&self, id: &ServiceId) -> Result<Option<Service>, DomainError> {
        Ok(self
            .services
            .read()
            .expect("services lock poisoned")
            .get(id)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[ServiceId]) -> Result<Vec<Service>, DomainError> {
        let services = self.services.read().expect("services lock poisoned");
        Ok(ids.iter().filter_map(|id| services.get(id).cloned()).collect())
    }
}

#[async_trait]
impl SubscriptionTypeRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        id: &SubscriptionTypeId,
    ) -> Result<Option<SubscriptionType>, DomainError> {
        Ok(self
            .types
            .read()
            .expect("types lock poisoned")
            .get(id)
            .cloned())
    }

    async fn find_tier(&self, id: &PriceTierId) -> Result<Option<PriceTier>, DomainError> {
        Ok(self
            .tiers
            .read()
            .expect("tiers lock poisoned")
            .get(id)
            .cloned())
    }
}

#[async_trait]
impl TypeServiceRepository for InMemoryStore {
    async fn service_ids_for(
        &self,
        type_id: &SubscriptionTypeId,
    ) -> Result<Vec<ServiceId>, DomainError> {
        Ok(self
            .associations
            .read()
            .expect("associations lock poisoned")
            .iter()
            .filter(|a| a.type_id == *type_id)
            .map(|a| a.service_id)
            .collect())
    }

    async fn services_for(
        &self,
        type_id: &SubscriptionTypeId,
    ) -> Result<Vec<Service>, DomainError> {
        let ids = self.service_ids_for(type_id).await?;
        let services = self.services.read().expect("services lock poisoned");
        let mut result: Vec<Service> = ids
            .iter()
            .filter_map(|id| services.get(id).cloned())
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn apply_diff(
        &self,
        type_id: &SubscriptionTypeId,
        to_add: &[ServiceId],
        to_remove: &[ServiceId],
    ) -> Result<(), DomainError> {
        let mut associations = self.associations.write().expect("associations lock poisoned");
        associations
            .retain(|a| !(a.type_id == *type_id && to_remove.contains(&a.service_id)));
        for service_id in to_add {
            // Re-check membership so a concurrent insert cannot duplicate.
            let already = associations
                .iter()
                .any(|a| a.type_id == *type_id && a.service_id == *service_id);
            if !already {
                associations.push(TypeServiceAssociation {
                    type_id: *type_id,
                    service_id: *service_id,
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryStore {
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .expect("subscriptions lock poisoned")
            .get(id)
            .cloned())
    }

    async fn list(&self, filter: &SubscriptionFilter) -> Result<Vec<Subscription>, DomainError> {
        let subscriptions = self
            .subscriptions
            .read()
            .expect("subscriptions lock poisoned");
        let mut result: Vec<Subscription> = subscriptions
            .values()
            .filter(|s| filter.client_id.map_or(true, |c| s.client_id == c))
            .filter(|s| filter.type_id.map_or(true, |t| s.type_id == t))
            .filter(|s| filter.status.map_or(true, |st| s.status == st))
            .filter(|s| filter.valid_from_min.map_or(true, |t| s.valid_from >= t))
            .filter(|s| filter.valid_from_max.map_or(true, |t| s.valid_from <= t))
            .filter(|s| filter.valid_until_min.map_or(true, |t| s.valid_until >= t))
            .filter(|s| filter.valid_until_max.map_or(true, |t| s.valid_until <= t))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.valid_until.cmp(&a.valid_until));
        Ok(result)
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .expect("subscriptions lock poisoned");
        if !subscriptions.contains_key(&subscription.id) {
            return Err(DomainError::not_found(
                ErrorCode::SubscriptionNotFound,
                "Subscription",
                subscription.id,
            ));
        }
        subscriptions.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn delete(&self, id: &SubscriptionId) -> Result<(), DomainError> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .expect("subscriptions lock poisoned");
        if subscriptions.remove(id).is_none() {
            return Err(DomainError::not_found(
                ErrorCode::SubscriptionNotFound,
                "Subscription",
                id,
            ));
        }
        Ok(())
    }

    async fn find_expired_active(
        &self,
        now: Timestamp,
    ) -> Result<Vec<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .expect("subscriptions lock poisoned")
            .values()
            .filter(|s| s.status.bucket() == StatusBucket::Active && s.valid_until < now)
            .cloned()
            .collect())
    }

    async fn find_expiring_within(
        &self,
        now: Timestamp,
        days: i64,
    ) -> Result<Vec<Subscription>, DomainError> {
        let limit = now.add_days(days);
        let mut result: Vec<Subscription> = self
            .subscriptions
            .read()
            .expect("subscriptions lock poisoned")
            .values()
            .filter(|s| {
                s.status.bucket() == StatusBucket::Active
                    && s.valid_until >= now
                    && s.valid_until <= limit
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| a.valid_until.cmp(&b.valid_until));
        Ok(result)
    }
}

#[async_trait]
impl AccessGrantRepository for InMemoryStore {
    async fn insert(&self, grant: &AccessGrant) -> Result<(), DomainError> {
        let mut grants = self.grants.write().expect("grants lock poisoned");
        let duplicate = grants
            .values()
            .any(|g| g.client_id == grant.client_id && g.service_id == grant.service_id);
        if duplicate {
            return Err(DomainError::new(
                ErrorCode::DuplicateGrant,
                format!(
                    "Client {} already has a grant for service {}",
                    grant.client_id, grant.service_id
                ),
            ));
        }
        grants.insert(grant.id, grant.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &AccessGrantId) -> Result<Option<AccessGrant>, DomainError> {
        Ok(self
            .grants
            .read()
            .expect("grants lock poisoned")
            .get(id)
            .cloned())
    }

    async fn find_pair(
        &self,
        client_id: &ClientId,
        service_id: &ServiceId,
    ) -> Result<Option<AccessGrant>, DomainError> {
        Ok(self
            .grants
            .read()
            .expect("grants lock poisoned")
            .values()
            .find(|g| g.client_id == *client_id && g.service_id == *service_id)
            .cloned())
    }

    async fn update(&self, grant: &AccessGrant) -> Result<(), DomainError> {
        let mut grants = self.grants.write().expect("grants lock poisoned");
        if !grants.contains_key(&grant.id) {
            return Err(DomainError::not_found(
                ErrorCode::GrantNotFound,
                "Access grant",
                grant.id,
            ));
        }
        grants.insert(grant.id, grant.clone());
        Ok(())
    }

    async fn delete(&self, id: &AccessGrantId) -> Result<(), DomainError> {
        let mut grants = self.grants.write().expect("grants lock poisoned");
        if grants.remove(id).is_none() {
            return Err(DomainError::not_found(
                ErrorCode::GrantNotFound,
                "Access grant",
                id,
            ));
        }
        Ok(())
    }

    async fn active_for_client(
        &self,
        client_id: &ClientId,
        at: Timestamp,
    ) -> Result<Vec<AccessGrant>, DomainError> {
        let mut result: Vec<AccessGrant> = self
            .grants
            .read()
            .expect("grants lock poisoned")
            .values()
            .filter(|g| g.client_id == *client_id && g.is_active_at(at))
            .cloned()
            .collect();
        result.sort_by_key(|g| self.service_name(&g.service_id));
        Ok(result)
    }

    async fn active_for_service(
        &self,
        service_id: &ServiceId,
        at: Timestamp,
    ) -> Result<Vec<AccessGrant>, DomainError> {
        let mut result: Vec<AccessGrant> = self
            .grants
            .read()
            .expect("grants lock poisoned")
            .values()
            .filter(|g| g.service_id == *service_id && g.is_active_at(at))
            .cloned()
            .collect();
        result.sort_by_key(|g| self.client_name(&g.client_id));
        Ok(result)
    }

    async fn find_by_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<AccessGrant>, DomainError> {
        Ok(self
            .grants
            .read()
            .expect("grants lock poisoned")
            .values()
            .filter(|g| g.subscription_id == Some(*subscription_id))
            .cloned()
            .collect())
    }

    async fn count_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<u64, DomainError> {
        Ok(self
            .find_by_subscription(subscription_id)
            .await?
            .len() as u64)
    }
}

#[async_trait]
impl SubscriptionStore for InMemoryStore {
    async fn create_with_grants(
        &self,
        subscription: &Subscription,
        grants: &[AccessGrant],
    ) -> Result<u64, DomainError> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .expect("subscriptions lock poisoned");
        let mut stored_grants = self.grants.write().expect("grants lock poisoned");

        subscriptions.insert(subscription.id, subscription.clone());
        let mut created = 0u64;
        for grant in grants {
            let exists = stored_grants
                .values()
                .any(|g| g.client_id == grant.client_id && g.service_id == grant.service_id);
            if !exists {
                stored_grants.insert(grant.id, grant.clone());
                created += 1;
            }
        }
        Ok(created)
    }

    async fn renew_with_grants(
        &self,
        subscription: &Subscription,
        prior: &SubscriptionId,
        fresh_grants: &[AccessGrant],
        extend_until: Timestamp,
    ) -> Result<(u64, u64), DomainError> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .expect("subscriptions lock poisoned");
        let mut stored_grants = self.grants.write().expect("grants lock poisoned");

        subscriptions.insert(subscription.id, subscription.clone());

        let mut extended = 0u64;
        for grant in stored_grants.values_mut() {
            if grant.subscription_id == Some(*prior) {
                grant.set_end(Some(extend_until));
                extended += 1;
            }
        }

        let mut created = 0u64;
        for grant in fresh_grants {
            let exists = stored_grants
                .values()
                .any(|g| g.client_id == grant.client_id && g.service_id == grant.service_id);
            if !exists {
                stored_grants.insert(grant.id, grant.clone());
                created += 1;
            }
        }
        Ok((extended, created))
    }

    async fn update_with_rewrite(
        &self,
        subscription: &Subscription,
        rewrite_until: Option<Timestamp>,
    ) -> Result<(), DomainError> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .expect("subscriptions lock poisoned");
        if !subscriptions.contains_key(&subscription.id) {
            return Err(DomainError::not_found(
                ErrorCode::SubscriptionNotFound,
                "Subscription",
                subscription.id,
            ));
        }
        subscriptions.insert(subscription.id, subscription.clone());

        if let Some(new_until) = rewrite_until {
            let mut stored_grants = self.grants.write().expect("grants lock poisoned");
            for grant in stored_grants.values_mut() {
                if grant.subscription_id == Some(subscription.id) {
                    grant.set_end(Some(new_until));
                }
            }
        }
        Ok(())
    }

    async fn terminate(
        &self,
        subscription: &Subscription,
        at: Timestamp,
    ) -> Result<u64, DomainError> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .expect("subscriptions lock poisoned");
        if !subscriptions.contains_key(&subscription.id) {
            return Err(DomainError::not_found(
                ErrorCode::SubscriptionNotFound,
                "Subscription",
                subscription.id,
            ));
        }
        subscriptions.insert(subscription.id, subscription.clone());

        let mut stored_grants = self.grants.write().expect("grants lock poisoned");
        let mut shortened = 0u64;
        for grant in stored_grants.values_mut() {
            if grant.subscription_id == Some(subscription.id) && grant.terminate_at(at) {
                shortened += 1;
            }
        }
        Ok(shortened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::AccessWindow;
    use crate::domain::subscription::SubscriptionStatus;

    fn day(d: u32) -> Timestamp {
        Timestamp::from_ymd(2025, 1, d).unwrap()
    }

    fn grant_for(
        client_id: ClientId,
        service_id: ServiceId,
        subscription_id: Option<SubscriptionId>,
    ) -> AccessGrant {
        AccessGrant::new(
            AccessGrantId::new(),
            client_id,
            service_id,
            subscription_id,
            AccessWindow::bounded(day(1), day(31)).unwrap(),
            day(1),
        )
    }

    fn subscription_for(client_id: ClientId) -> Subscription {
        Subscription::new(
            SubscriptionId::new(),
            client_id,
            SubscriptionTypeId::new(),
            PriceTierId::new(),
            day(1),
            day(31),
            4500,
            day(1),
            SubscriptionStatus::Active,
            None,
            day(1),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_pair() {
        let store = InMemoryStore::new();
        let client_id = ClientId::new();
        let service_id = ServiceId::new();

        AccessGrantRepository::insert(&store, &grant_for(client_id, service_id, None))
            .await
            .unwrap();
        let err = AccessGrantRepository::insert(&store, &grant_for(client_id, service_id, None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateGrant);
    }

    #[tokio::test]
    async fn create_with_grants_skips_existing_pairs() {
        let store = InMemoryStore::new();
        let client_id = ClientId::new();
        let service_id = ServiceId::new();
        let sub = subscription_for(client_id);

        store.seed_grant(grant_for(client_id, service_id, None));

        let created = store
            .create_with_grants(&sub, &[grant_for(client_id, service_id, Some(sub.id))])
            .await
            .unwrap();
        assert_eq!(created, 0);
        assert_eq!(store.all_grants().len(), 1);
    }

    #[tokio::test]
    async fn terminate_only_shortens_later_ends() {
        let store = InMemoryStore::new();
        let client_id = ClientId::new();
        let mut sub = subscription_for(client_id);
        store.seed_subscription(sub.clone());

        let mut early = grant_for(client_id, ServiceId::new(), Some(sub.id));
        early.set_end(Some(day(10)));
        store.seed_grant(early.clone());
        store.seed_grant(grant_for(client_id, ServiceId::new(), Some(sub.id)));

        sub.cancel(day(15)).unwrap();
        let shortened = store.terminate(&sub, day(15)).await.unwrap();
        assert_eq!(shortened, 1);

        let early_after = AccessGrantRepository::find_by_id(&store, &early.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(early_after.window.until(), Some(day(10)));
    }

    #[tokio::test]
    async fn apply_diff_recheck_prevents_duplicates() {
        let store = InMemoryStore::new();
        let type_id = SubscriptionTypeId::new();
        let service_id = ServiceId::new();
        store.seed_association(type_id, service_id);

        store
            .apply_diff(&type_id, &[service_id], &[])
            .await
            .unwrap();
        assert_eq!(store.all_associations().len(), 1);
    }
}
