//! Access domain module - per-service access grants.

mod grant;

pub use grant::AccessGrant;
