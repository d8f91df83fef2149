//! PostgreSQL implementation of ClientRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::catalog::Client;
use crate::domain::foundation::{ClientId, DomainError, ErrorCode, Timestamp};
use crate::ports::ClientRepository;

pub struct PostgresClientRepository {
    pool: PgPool,
}

impl PostgresClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    phone: String,
    email: Option<String>,
    enabled: bool,
    registered_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: ClientId::from_uuid(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            email: row.email,
            enabled: row.enabled,
            registered_at: Timestamp::from_datetime(row.registered_at),
        }
    }
}

#[async_trait]
impl ClientRepository for PostgresClientRepository {
    async fn find_by_id(&self, id: &ClientId) -> Result<Option<Client>, DomainError> {
        let row: Option<ClientRow> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, phone, email, enabled, registered_at
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find client: {}", e))
        })?;

        Ok(row.map(Client::from))
    }
}
