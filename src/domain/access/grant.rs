//! Service access grant entity.
//!
//! A grant gives one client access to one service during an access window.
//! Grants provisioned from a subscription carry a back-reference to it; the
//! reference is nullable because grants may also be issued directly.
//!
//! End dates are only ever rewritten, never cascade-deleted: renewal extends
//! them, termination shortens them, natural expiry leaves them alone.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AccessGrantId, AccessWindow, ClientId, ServiceId, SubscriptionId, Timestamp,
};

/// A client's access to a service within a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub id: AccessGrantId,
    pub client_id: ClientId,
    pub service_id: ServiceId,
    /// Subscription that provisioned this grant, if any.
    pub subscription_id: Option<SubscriptionId>,
    pub window: AccessWindow,
    pub created_at: Timestamp,
}

impl AccessGrant {
    pub fn new(
        id: AccessGrantId,
        client_id: ClientId,
        service_id: ServiceId,
        subscription_id: Option<SubscriptionId>,
        window: AccessWindow,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            client_id,
            service_id,
            subscription_id,
            window,
            created_at: now,
        }
    }

    /// True iff the grant's window is active at `t`.
    pub fn is_active_at(&self, t: Timestamp) -> bool {
        self.window.is_active_at(t)
    }

    /// Unconditionally rewrites the end date (renewal / window-edit path).
    ///
    /// The caller decides direction; renewal only ever passes a later date.
    pub fn set_end(&mut self, new_until: Option<Timestamp>) {
        self.window = self.window.with_end(new_until);
    }

    /// Shortens the window to end at `at` if it is open-ended or ends later.
    ///
    /// Returns true if the grant changed. Grants already ending at or before
    /// `at` are left untouched - termination never extends a window.
    pub fn terminate_at(&mut self, at: Timestamp) -> bool {
        match self.window.until() {
            Some(until) if until <= at => false,
            _ => {
                self.set_end(Some(at));
                true
            }
        }
    }
}
