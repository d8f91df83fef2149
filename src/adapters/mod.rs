//! Adapters - infrastructure implementations of the ports.

pub mod http;
pub mod in_memory;
pub mod postgres;
pub mod scheduler;
