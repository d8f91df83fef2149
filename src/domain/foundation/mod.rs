//! Foundation module - shared domain primitives.
//!
//! Value objects and traits used by every other domain module: identifiers,
//! timestamps, the interval policy, errors, and the state machine trait.

mod errors;
mod ids;
mod state_machine;
mod timestamp;
mod window;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    AccessGrantId, ClientId, PriceTierId, ServiceId, SubscriptionId, SubscriptionTypeId,
};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
pub use window::AccessWindow;
