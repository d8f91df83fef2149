//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    ClientId, DomainError, ErrorCode, PriceTierId, SubscriptionId, SubscriptionTypeId, Timestamp,
};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{SubscriptionFilter, SubscriptionRepository};

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct SubscriptionRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub type_id: Uuid,
    pub tier_id: Uuid,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub amount_paid_cents: i64,
    pub paid_at: DateTime<Utc>,
    pub status: String,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            client_id: ClientId::from_uuid(row.client_id),
            type_id: SubscriptionTypeId::from_uuid(row.type_id),
            tier_id: PriceTierId::from_uuid(row.tier_id),
            valid_from: Timestamp::from_datetime(row.valid_from),
            valid_until: Timestamp::from_datetime(row.valid_until),
            amount_paid_cents: row.amount_paid_cents,
            paid_at: Timestamp::from_datetime(row.paid_at),
            status: parse_status(&row.status)?,
            payment_method: row.payment_method,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

pub(super) fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(SubscriptionStatus::Pending),
        "active" => Ok(SubscriptionStatus::Active),
        "expired" => Ok(SubscriptionStatus::Expired),
        "cancelled" => Ok(SubscriptionStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )),
    }
}

pub(super) fn status_to_string(status: &SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Pending => "pending",
        SubscriptionStatus::Active => "active",
        SubscriptionStatus::Expired => "expired",
        SubscriptionStatus::Cancelled => "cancelled",
    }
}

const SELECT_COLUMNS: &str = "id, client_id, type_id, tier_id, valid_from, valid_until, \
     amount_paid_cents, paid_at, status, payment_method, created_at, updated_at";

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find subscription: {}", e),
            )
        })?;

        row.map(Subscription::try_from).transpose()
    }

    async fn list(&self, filter: &SubscriptionFilter) -> Result<Vec<Subscription>, DomainError> {
        // Fixed placeholder positions; absent filters collapse via IS NULL.
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM subscriptions
            WHERE ($1::uuid IS NULL OR client_id = $1)
              AND ($2::uuid IS NULL OR type_id = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::timestamptz IS NULL OR valid_from >= $4)
              AND ($5::timestamptz IS NULL OR valid_from <= $5)
              AND ($6::timestamptz IS NULL OR valid_until >= $6)
              AND ($7::timestamptz IS NULL OR valid_until <= $7)
            ORDER BY valid_until DESC
            "#
        ))
        .bind(filter.client_id.map(|id| *id.as_uuid()))
        .bind(filter.type_id.map(|id| *id.as_uuid()))
        .bind(filter.status.as_ref().map(status_to_string))
        .bind(filter.valid_from_min.map(|t| *t.as_datetime()))
        .bind(filter.valid_from_max.map(|t| *t.as_datetime()))
        .bind(filter.valid_until_min.map(|t| *t.as_datetime()))
        .bind(filter.valid_until_max.map(|t| *t.as_datetime()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list subscriptions: {}", e),
            )
        })?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                valid_from = $2,
                valid_until = $3,
                amount_paid_cents = $4,
                paid_at = $5,
                status = $6,
                payment_method = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.valid_from.as_datetime())
        .bind(subscription.valid_until.as_datetime())
        .bind(subscription.amount_paid_cents)
        .bind(subscription.paid_at.as_datetime())
        .bind(status_to_string(&subscription.status))
        .bind(&subscription.payment_method)
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update subscription: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(
                ErrorCode::SubscriptionNotFound,
                "Subscription",
                subscription.id,
            ));
        }

        Ok(())
    }

    async fn delete(&self, id: &SubscriptionId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to delete subscription: {}", e),
                )
            })?;

        if result.rows_affected() == 0 {
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
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM subscriptions
            WHERE status = 'active'
              AND valid_until < $1
            "#
        ))
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find lapsed subscriptions: {}", e),
            )
        })?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn find_expiring_within(
        &self,
        now: Timestamp,
        days: i64,
    ) -> Result<Vec<Subscription>, DomainError> {
        let limit = now.add_days(days);

        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM subscriptions
            WHERE status = 'active'
              AND valid_until >= $1
              AND valid_until <= $2
            ORDER BY valid_until ASC
            "#
        ))
        .bind(now.as_datetime())
        .bind(limit.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find expiring subscriptions: {}", e),
            )
        })?;

        rows.into_iter().map(Subscription::try_from).collect()
    }
}
