//! PostgreSQL implementation of TypeServiceRepository.
//!
//! The association table carries a unique (type_id, service_id) constraint;
//! diff inserts use `ON CONFLICT DO NOTHING` so a concurrent insert of the
//! same pair cannot fail the reconciliation or duplicate a row.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::catalog::Service;
use crate::domain::foundation::{DomainError, ErrorCode, ServiceId, SubscriptionTypeId};
use crate::ports::TypeServiceRepository;

use super::service_repository::ServiceRow;

pub struct PostgresTypeServiceRepository {
    pool: PgPool,
}

impl PostgresTypeServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TypeServiceRepository for PostgresTypeServiceRepository {
    async fn service_ids_for(
        &self,
        type_id: &SubscriptionTypeId,
    ) -> Result<Vec<ServiceId>, DomainError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT service_id
            FROM type_services
            WHERE type_id = $1
            "#,
        )
        .bind(type_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to load type service set: {}", e),
            )
        })?;

        Ok(rows
            .into_iter()
            .map(|(id,)| ServiceId::from_uuid(id))
            .collect())
    }

    async fn services_for(
        &self,
        type_id: &SubscriptionTypeId,
    ) -> Result<Vec<Service>, DomainError> {
        let rows: Vec<ServiceRow> = sqlx::query_as(
            r#"
            SELECT s.id, s.name, s.description, s.enabled, s.standard_duration_min, s.max_capacity
            FROM services s
            JOIN type_services ts ON ts.service_id = s.id
            WHERE ts.type_id = $1
            ORDER BY s.name ASC
            "#,
        )
        .bind(type_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to load type services: {}", e),
            )
        })?;

        Ok(rows.into_iter().map(Service::from).collect())
    }

    async fn apply_diff(
        &self,
        type_id: &SubscriptionTypeId,
        to_add: &[ServiceId],
        to_remove: &[ServiceId],
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to begin transaction: {}", e))
        })?;

        if !to_remove.is_empty() {
            let uuids: Vec<Uuid> = to_remove.iter().map(|id| *id.as_uuid()).collect();
            sqlx::query(
                r#"
                DELETE FROM type_services
                WHERE type_id = $1 AND service_id = ANY($2)
                "#,
            )
            .bind(type_id.as_uuid())
            .bind(&uuids)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to remove type services: {}", e),
                )
            })?;
        }

        for service_id in to_add {
            sqlx::query(
                r#"
                INSERT INTO type_services (type_id, service_id)
                VALUES ($1, $2)
                ON CONFLICT (type_id, service_id) DO NOTHING
                "#,
            )
            .bind(type_id.as_uuid())
            .bind(service_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to add type service: {}", e),
                )
            })?;
        }

        tx.commit().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to commit diff: {}", e))
        })?;

        Ok(())
    }
}
