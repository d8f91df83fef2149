//! PostgreSQL implementation of AccessGrantRepository.
//!
//! The `access_grants` table carries a unique (client_id, service_id)
//! constraint; `insert` maps that violation to `DuplicateGrant`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{
    AccessGrantId, AccessWindow, ClientId, DomainError, ErrorCode, ServiceId, SubscriptionId,
    Timestamp,
};
use crate::ports::AccessGrantRepository;

pub struct PostgresAccessGrantRepository {
    pool: PgPool,
}

impl PostgresAccessGrantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct AccessGrantRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AccessGrantRow> for AccessGrant {
    type Error = DomainError;

    fn try_from(row: AccessGrantRow) -> Result<Self, Self::Error> {
        // Stored windows may have been shortened below their start by a
        // termination; rebuild without re-validating ordering.
        let window = AccessWindow::new(
            Timestamp::from_datetime(row.valid_from),
            row.valid_until.map(Timestamp::from_datetime),
        )
        .unwrap_or_else(|_| {
            AccessWindow::unbounded(Timestamp::from_datetime(row.valid_from))
                .with_end(row.valid_until.map(Timestamp::from_datetime))
        });

        Ok(AccessGrant {
            id: AccessGrantId::from_uuid(row.id),
            client_id: ClientId::from_uuid(row.client_id),
            service_id: ServiceId::from_uuid(row.service_id),
            subscription_id: row.subscription_id.map(SubscriptionId::from_uuid),
            window,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

pub(super) const GRANT_COLUMNS: &str =
    "id, client_id, service_id, subscription_id, valid_from, valid_until, created_at";

#[async_trait]
impl AccessGrantRepository for PostgresAccessGrantRepository {
    async fn insert(&self, grant: &AccessGrant) -> Result<(), DomainError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO access_grants ({GRANT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#
        ))
        .bind(grant.id.as_uuid())
        .bind(grant.client_id.as_uuid())
        .bind(grant.service_id.as_uuid())
        .bind(grant.subscription_id.map(|id| *id.as_uuid()))
        .bind(grant.window.from().as_datetime())
        .bind(grant.window.until().map(|t| *t.as_datetime()))
        .bind(grant.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("access_grants_client_id_service_id_key") {
                    return DomainError::new(
                        ErrorCode::DuplicateGrant,
                        "Client already has a grant for this service",
                    );
                }
            }
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to insert grant: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &AccessGrantId) -> Result<Option<AccessGrant>, DomainError> {
        let row: Option<AccessGrantRow> = sqlx::query_as(&format!(
            "SELECT {GRANT_COLUMNS} FROM access_grants WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find grant: {}", e))
        })?;

        row.map(AccessGrant::try_from).transpose()
    }

    async fn find_pair(
        &self,
        client_id: &ClientId,
        service_id: &ServiceId,
    ) -> Result<Option<AccessGrant>, DomainError> {
        let row: Option<AccessGrantRow> = sqlx::query_as(&format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM access_grants
            WHERE client_id = $1 AND service_id = $2
            "#
        ))
        .bind(client_id.as_uuid())
        .bind(service_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find grant: {}", e))
        })?;

        row.map(AccessGrant::try_from).transpose()
    }

    async fn update(&self, grant: &AccessGrant) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE access_grants SET
                subscription_id = $2,
                valid_from = $3,
                valid_until = $4
            WHERE id = $1
            "#,
        )
        .bind(grant.id.as_uuid())
        .bind(grant.subscription_id.map(|id| *id.as_uuid()))
        .bind(grant.window.from().as_datetime())
        .bind(grant.window.until().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to update grant: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(
                ErrorCode::GrantNotFound,
                "Access grant",
                grant.id,
            ));
        }

        Ok(())
    }

    async fn delete(&self, id: &AccessGrantId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM access_grants WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to delete grant: {}", e))
            })?;

        if result.rows_affected() == 0 {
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
        let rows: Vec<AccessGrantRow> = sqlx::query_as(
            r#"
            SELECT g.id, g.client_id, g.service_id, g.subscription_id,
                   g.valid_from, g.valid_until, g.created_at
            FROM access_grants g
            JOIN services s ON s.id = g.service_id
            WHERE g.client_id = $1
              AND g.valid_from <= $2
              AND (g.valid_until IS NULL OR g.valid_until >= $2)
            ORDER BY s.name ASC
            "#,
        )
        .bind(client_id.as_uuid())
        .bind(at.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list active grants: {}", e),
            )
        })?;

        rows.into_iter().map(AccessGrant::try_from).collect()
    }

    async fn active_for_service(
        &self,
        service_id: &ServiceId,
        at: Timestamp,
    ) -> Result<Vec<AccessGrant>, DomainError> {
        let rows: Vec<AccessGrantRow> = sqlx::query_as(
            r#"
            SELECT g.id, g.client_id, g.service_id, g.subscription_id,
                   g.valid_from, g.valid_until, g.created_at
            FROM access_grants g
            JOIN clients c ON c.id = g.client_id
            WHERE g.service_id = $1
              AND g.valid_from <= $2
              AND (g.valid_until IS NULL OR g.valid_until >= $2)
            ORDER BY c.last_name ASC, c.first_name ASC
            "#,
        )
        .bind(service_id.as_uuid())
        .bind(at.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list active grants: {}", e),
            )
        })?;

        rows.into_iter().map(AccessGrant::try_from).collect()
    }

    async fn find_by_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<AccessGrant>, DomainError> {
        let rows: Vec<AccessGrantRow> = sqlx::query_as(&format!(
            "SELECT {GRANT_COLUMNS} FROM access_grants WHERE subscription_id = $1"
        ))
        .bind(subscription_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list subscription grants: {}", e),
            )
        })?;

        rows.into_iter().map(AccessGrant::try_from).collect()
    }

    async fn count_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<u64, DomainError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM access_grants WHERE subscription_id = $1")
                .bind(subscription_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to count subscription grants: {}", e),
                    )
                })?;

        Ok(count as u64)
    }
}
