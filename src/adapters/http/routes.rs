//! Axum router configuration for the gymdesk API.
//!
//! This module defines the route structure and wires each route to its
//! corresponding handler.

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers::{
    check_access, create_subscription, get_subscription, grant_access, list_active_clients,
    list_active_services, list_expiring, list_subscriptions, list_type_services,
    reconcile_type_services, remove_subscription, renew_subscription, revoke_access, sweep_expired,
    terminate_subscription, update_access_grant, update_subscription, AppState,
};

/// Create the subscription lifecycle router.
///
/// # Routes
/// - `POST /` - Purchase a subscription (cascades access grants)
/// - `GET /` - List subscriptions by filter
/// - `GET /expiring` - List active subscriptions ending within a horizon
/// - `POST /sweep` - Run one expiration sweep pass
/// - `GET /:id` - Fetch a subscription with its grants
/// - `PATCH /:id` - Edit subscription fields
/// - `DELETE /:id` - Remove a subscription without provisioned grants
/// - `POST /:id/renew` - Renew into a fresh period
/// - `POST /:id/terminate` - End access early
pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_subscription).get(list_subscriptions))
        .route("/expiring", get(list_expiring))
        .route("/sweep", post(sweep_expired))
        .route(
            "/:id",
            get(get_subscription)
                .patch(update_subscription)
                .delete(remove_subscription),
        )
        .route("/:id/renew", post(renew_subscription))
        .route("/:id/terminate", post(terminate_subscription))
}

/// Create the access grant router.
///
/// # Routes
/// - `POST /` - Grant a client direct access to a service
/// - `GET /check` - Evaluate whether a client may use a service
/// - `PATCH /:id` - Replace a grant's validity window
/// - `DELETE /:id` - Revoke a grant
pub fn access_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(grant_access))
        .route("/check", get(check_access))
        .route("/:id", patch(update_access_grant).delete(revoke_access))
}

/// Create the catalog router for per-entity access listings and the
/// type/service reconciler.
///
/// # Routes
/// - `GET /clients/:id/services` - Services a client can currently use
/// - `GET /services/:id/clients` - Clients currently allowed into a service
/// - `GET /subscription-types/:id/services` - A type's grantable service set
/// - `PUT /subscription-types/:id/services` - Reconcile the grantable set
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/clients/:id/services", get(list_active_services))
        .route("/services/:id/clients", get(list_active_clients))
        .route(
            "/subscription-types/:id/services",
            get(list_type_services).put(reconcile_type_services),
        )
}

/// Create the complete API router, suitable for nesting under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/subscriptions", subscription_routes())
        .nest("/access", access_routes())
        .merge(catalog_routes())
}
