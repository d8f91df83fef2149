//! Command handlers, grouped by the engine component they drive.

pub mod access;
pub mod subscription;
pub mod type_services;
