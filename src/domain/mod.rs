//! Domain layer - pure business model, no I/O.

pub mod access;
pub mod catalog;
pub mod foundation;
pub mod subscription;
