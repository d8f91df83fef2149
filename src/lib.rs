//! Gymdesk - gym membership administration backend.
//!
//! Implements time-bounded subscriptions over priced duration tiers, with
//! per-service access grants cascaded from each purchase and a background
//! sweeper that lapses overdue subscriptions.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
