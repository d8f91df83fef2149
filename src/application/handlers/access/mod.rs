//! Access grant handlers - direct grant management and access checks.

mod check_access;
mod grant_access;
mod list_active_clients;
mod list_active_services;
mod revoke_access;
mod update_access_grant;

pub use check_access::{CheckAccessCommand, CheckAccessHandler, CheckAccessResult};
pub use grant_access::{GrantAccessCommand, GrantAccessHandler, GrantAccessResult};
pub use list_active_clients::{
    ActiveClient, ListActiveClientsCommand, ListActiveClientsHandler, ListActiveClientsResult,
};
pub use list_active_services::{
    ActiveService, ListActiveServicesCommand, ListActiveServicesHandler,
    ListActiveServicesResult,
};
pub use revoke_access::{RevokeAccessCommand, RevokeAccessHandler, RevokeAccessResult};
pub use update_access_grant::{
    UpdateAccessGrantCommand, UpdateAccessGrantHandler, UpdateAccessGrantResult,
};
