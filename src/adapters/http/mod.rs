//! HTTP adapter - REST API exposure of the subscription and access engine.
//!
//! - `POST /api/subscriptions` - purchase a subscription
//! - `GET /api/subscriptions` - list subscriptions by filter
//! - `GET /api/subscriptions/expiring` - subscriptions ending soon
//! - `POST /api/subscriptions/sweep` - run one expiration sweep pass
//! - `GET|PATCH|DELETE /api/subscriptions/:id` - fetch, edit, remove
//! - `POST /api/subscriptions/:id/renew` - renew into a fresh period
//! - `POST /api/subscriptions/:id/terminate` - end access early
//! - `POST /api/access` - direct access grant
//! - `GET /api/access/check` - access decision for a client/service pair
//! - `PATCH|DELETE /api/access/:id` - edit or revoke a grant
//! - `GET /api/clients/:id/services` - a client's active services
//! - `GET /api/services/:id/clients` - a service's active clients
//! - `GET|PUT /api/subscription-types/:id/services` - grantable service set

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::api_router;
