//! Subscription status state machine.
//!
//! Statuses form three behavioral buckets: pre-active (Pending), active
//! (Active), and closed (Expired, Cancelled). The expiration sweeper only
//! ever touches the active bucket; closed statuses are terminal.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a purchased subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Registered but not yet in effect (e.g. payment or start date pending).
    Pending,

    /// In effect; grants provisioned from it are live.
    Active,

    /// Window closed naturally; set by the expiration sweeper.
    Expired,

    /// Ended early by administrative termination.
    Cancelled,
}

/// Coarse behavioral bucket of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBucket {
    PreActive,
    Active,
    Closed,
}

impl SubscriptionStatus {
    /// The behavioral bucket this status belongs to.
    pub fn bucket(&self) -> StatusBucket {
        match self {
            SubscriptionStatus::Pending => StatusBucket::PreActive,
            SubscriptionStatus::Active => StatusBucket::Active,
            SubscriptionStatus::Expired | SubscriptionStatus::Cancelled => StatusBucket::Closed,
        }
    }

    /// True for statuses in the closed bucket.
    pub fn is_closed(&self) -> bool {
        self.bucket() == StatusBucket::Closed
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // From PENDING
            (Pending, Active)
                | (Pending, Cancelled)
            // From ACTIVE
                | (Active, Active) // manual edit keeping status
                | (Active, Expired)
                | (Active, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Pending => vec![Active, Cancelled],
            Active => vec![Active, Expired, Cancelled],
            Expired => vec![],
            Cancelled => vec![],
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}
