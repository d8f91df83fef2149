//! Type/service association handlers - the grantable-service reconciler.

mod list_type_services;
mod reconcile_type_services;

pub use list_type_services::{
    ListTypeServicesCommand, ListTypeServicesHandler, ListTypeServicesResult,
};
pub use reconcile_type_services::{
    ReconcileTypeServicesCommand, ReconcileTypeServicesHandler, ReconcileTypeServicesResult,
};
