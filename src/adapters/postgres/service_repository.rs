//! PostgreSQL implementation of ServiceRepository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::catalog::Service;
use crate::domain::foundation::{DomainError, ErrorCode, ServiceId};
use crate::ports::ServiceRepository;

pub struct PostgresServiceRepository {
    pool: PgPool,
}

impl PostgresServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ServiceRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub standard_duration_min: Option<i32>,
    pub max_capacity: Option<i32>,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: ServiceId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            enabled: row.enabled,
            standard_duration_min: row.standard_duration_min,
            max_capacity: row.max_capacity,
        }
    }
}

#[async_trait]
impl ServiceRepository for PostgresServiceRepository {
    async fn find_by_id(&self, id: &ServiceId) -> Result<Option<Service>, DomainError> {
        let row: Option<ServiceRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, enabled, standard_duration_min, max_capacity
            FROM services
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find service: {}", e))
        })?;

        Ok(row.map(Service::from))
    }

    async fn find_by_ids(&self, ids: &[ServiceId]) -> Result<Vec<Service>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<ServiceRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, enabled, standard_duration_min, max_capacity
            FROM services
            WHERE id = ANY($1)
            "#,
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find services: {}", e))
        })?;

        Ok(rows.into_iter().map(Service::from).collect())
    }
}
