//! Scheduler adapter - periodic background jobs.

mod expiration_task;

pub use expiration_task::{ExpirationSweeper, ExpirationSweeperConfig};
