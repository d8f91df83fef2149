//! Subscription domain module.
//!
//! The subscription aggregate and its status state machine. Cascading rules
//! (bulk grant provisioning, end-date rewrites, termination) are coordinated
//! by the application handlers; this module owns the per-row invariants.

mod aggregate;
mod status;

pub use aggregate::Subscription;
pub use status::{StatusBucket, SubscriptionStatus};
