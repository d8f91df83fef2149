//! UpdateAccessGrantHandler - manual edit of a grant's access window.

use std::sync::Arc;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{
    AccessGrantId, AccessWindow, DomainError, ErrorCode, Timestamp,
};
use crate::ports::AccessGrantRepository;

/// Command replacing a grant's window. `until = None` reopens the grant.
#[derive(Debug, Clone)]
pub struct UpdateAccessGrantCommand {
    pub grant_id: AccessGrantId,
    pub from: Timestamp,
    pub until: Option<Timestamp>,
}

#[derive(Debug, Clone)]
pub struct UpdateAccessGrantResult {
    pub grant: AccessGrant,
}

pub struct UpdateAccessGrantHandler {
    grants: Arc<dyn AccessGrantRepository>,
}

impl UpdateAccessGrantHandler {
    pub fn new(grants: Arc<dyn AccessGrantRepository>) -> Self {
        Self { grants }
    }

    pub async fn handle(
        &self,
        cmd: UpdateAccessGrantCommand,
    ) -> Result<UpdateAccessGrantResult, DomainError> {
        let mut grant = self
            .grants
            .find_by_id(&cmd.grant_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(ErrorCode::GrantNotFound, "Access grant", cmd.grant_id)
            })?;

        grant.window = AccessWindow::new(cmd.from, cmd.until)?;
        self.grants.update(&grant).await?;

        Ok(UpdateAccessGrantResult { grant })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryStore;
    use crate::domain::foundation::{ClientId, ServiceId};

    fn day(d: u32) -> Timestamp {
        Timestamp::from_ymd(2025, 1, d).unwrap()
    }

    fn seed_grant(store: &InMemoryStore) -> AccessGrantId {
        let grant = AccessGrant::new(
            AccessGrantId::new(),
            ClientId::new(),
            ServiceId::new(),
            None,
            AccessWindow::bounded(day(1), day(31)).unwrap(),
            day(1),
        );
        let id = grant.id;
        store.seed_grant(grant);
        id
    }

    #[tokio::test]
    async fn rewrites_window() {
        let store = Arc::new(InMemoryStore::new());
        let grant_id = seed_grant(&store);
        let handler = UpdateAccessGrantHandler::new(store.clone());

        let result = handler
            .handle(UpdateAccessGrantCommand {
                grant_id,
                from: day(5),
                until: Some(day(20)),
            })
            .await
            .unwrap();

        assert_eq!(result.grant.window.from(), day(5));
        assert_eq!(result.grant.window.until(), Some(day(20)));
    }

    #[tokio::test]
    async fn rejects_inverted_window() {
        let store = Arc::new(InMemoryStore::new());
        let grant_id = seed_grant(&store);
        let handler = UpdateAccessGrantHandler::new(store.clone());

        let err = handler
            .handle(UpdateAccessGrantCommand {
                grant_id,
                from: day(20),
                until: Some(day(10)),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidWindow);
    }

    #[tokio::test]
    async fn fails_for_unknown_grant() {
        let store = Arc::new(InMemoryStore::new());
        let handler = UpdateAccessGrantHandler::new(store.clone());

        let err = handler
            .handle(UpdateAccessGrantCommand {
                grant_id: AccessGrantId::new(),
                from: day(1),
                until: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::GrantNotFound);
    }
}
