//! PostgreSQL implementation of the transactional SubscriptionStore.
//!
//! Each cascade runs inside one `sqlx` transaction: the subscription write
//! and its grant writes commit or roll back together. Bulk provisioning
//! relies on the unique (client_id, service_id) constraint with
//! `ON CONFLICT DO NOTHING`, so concurrent provisioning of the same pair
//! cannot duplicate a grant or fail the purchase.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionStore;

use super::subscription_repository::status_to_string;

pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'_, Postgres>, DomainError> {
        self.pool.begin().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to begin transaction: {}", e))
        })
    }
}

fn db_err(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

async fn insert_subscription(
    tx: &mut Transaction<'_, Postgres>,
    subscription: &Subscription,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO subscriptions (
            id, client_id, type_id, tier_id, valid_from, valid_until,
            amount_paid_cents, paid_at, status, payment_method, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(subscription.id.as_uuid())
    .bind(subscription.client_id.as_uuid())
    .bind(subscription.type_id.as_uuid())
    .bind(subscription.tier_id.as_uuid())
    .bind(subscription.valid_from.as_datetime())
    .bind(subscription.valid_until.as_datetime())
    .bind(subscription.amount_paid_cents)
    .bind(subscription.paid_at.as_datetime())
    .bind(status_to_string(&subscription.status))
    .bind(&subscription.payment_method)
    .bind(subscription.created_at.as_datetime())
    .bind(subscription.updated_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| db_err("Failed to insert subscription", e))?;

    Ok(())
}

async fn update_subscription(
    tx: &mut Transaction<'_, Postgres>,
    subscription: &Subscription,
) -> Result<(), DomainError> {
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
    .execute(&mut **tx)
    .await
    .map_err(|e| db_err("Failed to update subscription", e))?;

    if result.rows_affected() == 0 {
        return Err(DomainError::not_found(
            ErrorCode::SubscriptionNotFound,
            "Subscription",
            subscription.id,
        ));
    }

    Ok(())
}

/// Inserts grants, silently skipping existing (client, service) pairs.
/// Returns the number of rows actually created.
async fn insert_grants(
    tx: &mut Transaction<'_, Postgres>,
    grants: &[AccessGrant],
) -> Result<u64, DomainError> {
    let mut created = 0u64;
    for grant in grants {
        let result = sqlx::query(
            r#"
            INSERT INTO access_grants (
                id, client_id, service_id, subscription_id, valid_from, valid_until, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (client_id, service_id) DO NOTHING
            "#,
        )
        .bind(grant.id.as_uuid())
        .bind(grant.client_id.as_uuid())
        .bind(grant.service_id.as_uuid())
        .bind(grant.subscription_id.map(|id| *id.as_uuid()))
        .bind(grant.window.from().as_datetime())
        .bind(grant.window.until().map(|t| *t.as_datetime()))
        .bind(grant.created_at.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to provision grant", e))?;
        created += result.rows_affected();
    }
    Ok(created)
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn create_with_grants(
        &self,
        subscription: &Subscription,
        grants: &[AccessGrant],
    ) -> Result<u64, DomainError> {
        let mut tx = self.begin().await?;

        insert_subscription(&mut tx, subscription).await?;
        let created = insert_grants(&mut tx, grants).await?;

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit purchase", e))?;
        Ok(created)
    }

    async fn renew_with_grants(
        &self,
        subscription: &Subscription,
        prior: &SubscriptionId,
        fresh_grants: &[AccessGrant],
        extend_until: Timestamp,
    ) -> Result<(u64, u64), DomainError> {
        let mut tx = self.begin().await?;

        insert_subscription(&mut tx, subscription).await?;

        let extended = sqlx::query(
            r#"
            UPDATE access_grants
            SET valid_until = $2
            WHERE subscription_id = $1
            "#,
        )
        .bind(prior.as_uuid())
        .bind(extend_until.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("Failed to extend grants", e))?
        .rows_affected();

        let created = insert_grants(&mut tx, fresh_grants).await?;

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit renewal", e))?;
        Ok((extended, created))
    }

    async fn update_with_rewrite(
        &self,
        subscription: &Subscription,
        rewrite_until: Option<Timestamp>,
    ) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;

        update_subscription(&mut tx, subscription).await?;

        if let Some(new_until) = rewrite_until {
            sqlx::query(
                r#"
                UPDATE access_grants
                SET valid_until = $2
                WHERE subscription_id = $1
                "#,
            )
            .bind(subscription.id.as_uuid())
            .bind(new_until.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("Failed to rewrite grant windows", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit update", e))?;
        Ok(())
    }

    async fn terminate(
        &self,
        subscription: &Subscription,
        at: Timestamp,
    ) -> Result<u64, DomainError> {
        let mut tx = self.begin().await?;

        update_subscription(&mut tx, subscription).await?;

        // Shorten-only: rows already ending at or before `at` are skipped.
        let shortened = sqlx::query(
            r#"
            UPDATE access_grants
            SET valid_until = $2
            WHERE subscription_id = $1
              AND (valid_until IS NULL OR valid_until > $2)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("Failed to shorten grants", e))?
        .rows_affected();

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit termination", e))?;
        Ok(shortened)
    }
}
