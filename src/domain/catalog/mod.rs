//! Catalog module - reference entities the engine validates against.
//!
//! Clients, services, subscription types, and their price tiers. These are
//! plain records with field validation; their CRUD lives behind the storage
//! ports and is not part of the temporal engine.

mod client;
mod service;
mod subscription_type;

pub use client::Client;
pub use service::Service;
pub use subscription_type::{PriceTier, SubscriptionType, TypeServiceAssociation};
