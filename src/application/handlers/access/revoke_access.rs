//! RevokeAccessHandler - removes a grant outright.

use std::sync::Arc;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{AccessGrantId, DomainError, ErrorCode};
use crate::ports::AccessGrantRepository;

#[derive(Debug, Clone)]
pub struct RevokeAccessCommand {
    pub grant_id: AccessGrantId,
}

/// Result carrying the removed grant.
#[derive(Debug, Clone)]
pub struct RevokeAccessResult {
    pub grant: AccessGrant,
}

/// Handler deleting a grant. Revocation is for erroneous grants; ending
/// access early is normally done by shortening the window instead.
pub struct RevokeAccessHandler {
    grants: Arc<dyn AccessGrantRepository>,
}

impl RevokeAccessHandler {
    pub fn new(grants: Arc<dyn AccessGrantRepository>) -> Self {
        Self { grants }
    }

    pub async fn handle(
        &self,
        cmd: RevokeAccessCommand,
    ) -> Result<RevokeAccessResult, DomainError> {
        let grant = self
            .grants
            .find_by_id(&cmd.grant_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(ErrorCode::GrantNotFound, "Access grant", cmd.grant_id)
            })?;
        self.grants.delete(&cmd.grant_id).await?;

        Ok(RevokeAccessResult { grant })
    }
}
