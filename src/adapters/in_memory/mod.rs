//! In-memory adapters - deterministic implementations for tests.

mod store;

pub use store::InMemoryStore;
