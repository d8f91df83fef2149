//! PostgreSQL implementation of SubscriptionTypeRepository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::catalog::{PriceTier, SubscriptionType};
use crate::domain::foundation::{
    DomainError, ErrorCode, PriceTierId, SubscriptionTypeId,
};
use crate::ports::SubscriptionTypeRepository;

pub struct PostgresSubscriptionTypeRepository {
    pool: PgPool,
}

impl PostgresSubscriptionTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionTypeRow {
    id: Uuid,
    name: String,
    description: Option<String>,
}

impl From<SubscriptionTypeRow> for SubscriptionType {
    fn from(row: SubscriptionTypeRow) -> Self {
        SubscriptionType {
            id: SubscriptionTypeId::from_uuid(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PriceTierRow {
    id: Uuid,
    type_id: Uuid,
    duration_days: i64,
    price_cents: i64,
    audience: Option<String>,
}

impl From<PriceTierRow> for PriceTier {
    fn from(row: PriceTierRow) -> Self {
        PriceTier {
            id: PriceTierId::from_uuid(row.id),
            type_id: SubscriptionTypeId::from_uuid(row.type_id),
            duration_days: row.duration_days,
            price_cents: row.price_cents,
            audience: row.audience,
        }
    }
}

#[async_trait]
impl SubscriptionTypeRepository for PostgresSubscriptionTypeRepository {
    async fn find_by_id(
        &self,
        id: &SubscriptionTypeId,
    ) -> Result<Option<SubscriptionType>, DomainError> {
        let row: Option<SubscriptionTypeRow> = sqlx::query_as(
            r#"
            SELECT id, name, description
            FROM subscription_types
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find subscription type: {}", e),
            )
        })?;

        Ok(row.map(SubscriptionType::from))
    }

    async fn find_tier(&self, id: &PriceTierId) -> Result<Option<PriceTier>, DomainError> {
        let row: Option<PriceTierRow> = sqlx::query_as(
            r#"
            SELECT id, type_id, duration_days, price_cents, audience
            FROM price_tiers
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find price tier: {}", e),
            )
        })?;

        Ok(row.map(PriceTier::from))
    }
}
