//! HTTP handlers for the gymdesk API.
//!
//! These handlers connect Axum routes to application layer command handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::handlers::access::{
    CheckAccessCommand, CheckAccessHandler, GrantAccessCommand, GrantAccessHandler,
    ListActiveClientsCommand, ListActiveClientsHandler, ListActiveServicesCommand,
    ListActiveServicesHandler, RevokeAccessCommand, RevokeAccessHandler, UpdateAccessGrantCommand,
    UpdateAccessGrantHandler,
};
use crate::application::handlers::subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, GetSubscriptionCommand,
    GetSubscriptionHandler, ListExpiringCommand, ListExpiringHandler, ListSubscriptionsCommand,
    ListSubscriptionsHandler, RemoveSubscriptionCommand, RemoveSubscriptionHandler,
    RenewSubscriptionCommand, RenewSubscriptionHandler, SweepExpiredHandler,
    TerminateSubscriptionCommand, TerminateSubscriptionHandler, UpdateSubscriptionCommand,
    UpdateSubscriptionHandler,
};
use crate::application::handlers::type_services::{
    ListTypeServicesCommand, ListTypeServicesHandler, ReconcileTypeServicesCommand,
    ReconcileTypeServicesHandler,
};
use crate::domain::foundation::{
    AccessGrantId, ClientId, DomainError, ErrorCode, PriceTierId, ServiceId, SubscriptionId,
    SubscriptionTypeId, Timestamp,
};
use crate::ports::{
    AccessGrantRepository, ClientRepository, Clock, ServiceRepository, SubscriptionFilter,
    SubscriptionRepository, SubscriptionStore, SubscriptionTypeRepository, TypeServiceRepository,
};

use super::dto::{
    AccessCheckResponse, AccessGrantResponse, ActiveAtQuery, ActiveClientResponse,
    ActiveClientsResponse, ActiveServiceResponse, ActiveServicesResponse, CheckAccessQuery,
    CreateSubscriptionRequest, CreateSubscriptionResponse, ErrorResponse, ExpiringQuery,
    GrantAccessRequest, ListSubscriptionsQuery, ReconcileTypeServicesRequest,
    ReconcileTypeServicesResponse, RenewSubscriptionRequest, RenewSubscriptionResponse,
    SubscriptionDetailResponse, SubscriptionListResponse, SubscriptionResponse, SweepResponse,
    TerminateSubscriptionRequest, TerminateSubscriptionResponse, TypeServicesResponse,
    UpdateAccessGrantRequest, UpdateSubscriptionRequest,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; dependencies are Arc-wrapped for cheap sharing.
#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<dyn ClientRepository>,
    pub services: Arc<dyn ServiceRepository>,
    pub types: Arc<dyn SubscriptionTypeRepository>,
    pub associations: Arc<dyn TypeServiceRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub grants: Arc<dyn AccessGrantRepository>,
    pub store: Arc<dyn SubscriptionStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create handlers on demand from the shared state.
    pub fn create_subscription_handler(&self) -> CreateSubscriptionHandler {
        CreateSubscriptionHandler::new(
            self.clients.clone(),
            self.types.clone(),
            self.associations.clone(),
            self.store.clone(),
            self.clock.clone(),
        )
    }

    pub fn renew_subscription_handler(&self) -> RenewSubscriptionHandler {
        RenewSubscriptionHandler::new(
            self.clients.clone(),
            self.types.clone(),
            self.associations.clone(),
            self.subscriptions.clone(),
            self.grants.clone(),
            self.store.clone(),
            self.clock.clone(),
        )
    }

    pub fn update_subscription_handler(&self) -> UpdateSubscriptionHandler {
        UpdateSubscriptionHandler::new(
            self.subscriptions.clone(),
            self.store.clone(),
            self.clock.clone(),
        )
    }

    pub fn terminate_subscription_handler(&self) -> TerminateSubscriptionHandler {
        TerminateSubscriptionHandler::new(
            self.subscriptions.clone(),
            self.store.clone(),
            self.clock.clone(),
        )
    }

    pub fn remove_subscription_handler(&self) -> RemoveSubscriptionHandler {
        RemoveSubscriptionHandler::new(self.subscriptions.clone(), self.grants.clone())
    }

    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.subscriptions.clone(), self.grants.clone())
    }

    pub fn list_subscriptions_handler(&self) -> ListSubscriptionsHandler {
        ListSubscriptionsHandler::new(self.subscriptions.clone())
    }

    pub fn list_expiring_handler(&self) -> ListExpiringHandler {
        ListExpiringHandler::new(self.subscriptions.clone(), self.clock.clone())
    }

    pub fn sweep_expired_handler(&self) -> SweepExpiredHandler {
        SweepExpiredHandler::new(self.subscriptions.clone(), self.clock.clone())
    }

    pub fn grant_access_handler(&self) -> GrantAccessHandler {
        GrantAccessHandler::new(
            self.clients.clone(),
            self.services.clone(),
            self.subscriptions.clone(),
            self.grants.clone(),
            self.clock.clone(),
        )
    }

    pub fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(
            self.clients.clone(),
            self.services.clone(),
            self.grants.clone(),
            self.clock.clone(),
        )
    }

    pub fn list_active_services_handler(&self) -> ListActiveServicesHandler {
        ListActiveServicesHandler::new(
            self.clients.clone(),
            self.services.clone(),
            self.grants.clone(),
            self.clock.clone(),
        )
    }

    pub fn list_active_clients_handler(&self) -> ListActiveClientsHandler {
        ListActiveClientsHandler::new(
            self.clients.clone(),
            self.services.clone(),
            self.grants.clone(),
            self.clock.clone(),
        )
    }

    pub fn update_access_grant_handler(&self) -> UpdateAccessGrantHandler {
        UpdateAccessGrantHandler::new(self.grants.clone())
    }

    pub fn revoke_access_handler(&self) -> RevokeAccessHandler {
        RevokeAccessHandler::new(self.grants.clone())
    }

    pub fn reconcile_type_services_handler(&self) -> ReconcileTypeServicesHandler {
        ReconcileTypeServicesHandler::new(
            self.types.clone(),
            self.services.clone(),
            self.associations.clone(),
        )
    }

    pub fn list_type_services_handler(&self) -> ListTypeServicesHandler {
        ListTypeServicesHandler::new(self.types.clone(), self.associations.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscription Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /subscriptions - purchase a subscription.
pub async fn create_subscription(
    State(state): State<AppState>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateSubscriptionCommand {
        client_id: ClientId::from_uuid(req.client_id),
        type_id: SubscriptionTypeId::from_uuid(req.type_id),
        tier_id: PriceTierId::from_uuid(req.tier_id),
        valid_from: req.valid_from.map(Timestamp::from_datetime),
        amount_paid_cents: req.amount_paid_cents,
        paid_at: req.paid_at.map(Timestamp::from_datetime),
        payment_method: req.payment_method,
    };

    let result = state.create_subscription_handler().handle(command).await?;
    let body = CreateSubscriptionResponse {
        subscription: result.subscription.into(),
        grants_created: result.grants_created,
    };
    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /subscriptions - list subscriptions by filter.
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Query(query): Query<ListSubscriptionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = SubscriptionFilter {
        client_id: query.client_id.map(ClientId::from_uuid),
        type_id: query.type_id.map(SubscriptionTypeId::from_uuid),
        status: query.status,
        valid_from_min: query.valid_from_min.map(Timestamp::from_datetime),
        valid_from_max: query.valid_from_max.map(Timestamp::from_datetime),
        valid_until_min: query.valid_until_min.map(Timestamp::from_datetime),
        valid_until_max: query.valid_until_max.map(Timestamp::from_datetime),
    };

    let result = state
        .list_subscriptions_handler()
        .handle(ListSubscriptionsCommand { filter })
        .await?;
    let body = SubscriptionListResponse {
        subscriptions: result.subscriptions.into_iter().map(Into::into).collect(),
    };
    Ok(Json(body))
}

/// GET /subscriptions/expiring - list active subscriptions ending soon.
pub async fn list_expiring(
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .list_expiring_handler()
        .handle(ListExpiringCommand { days: query.days })
        .await?;
    let body = SubscriptionListResponse {
        subscriptions: result.subscriptions.into_iter().map(Into::into).collect(),
    };
    Ok(Json(body))
}

/// POST /subscriptions/sweep - run one expiration sweep pass.
pub async fn sweep_expired(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let report = state.sweep_expired_handler().handle().await?;
    Ok(Json(SweepResponse {
        swept: report.swept,
        failed: report.failed,
    }))
}

/// GET /subscriptions/:id - fetch a subscription with its grants.
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .get_subscription_handler()
        .handle(GetSubscriptionCommand {
            subscription_id: SubscriptionId::from_uuid(id),
        })
        .await?;
    let body = SubscriptionDetailResponse {
        subscription: result.subscription.into(),
        grants: result.grants.into_iter().map(Into::into).collect(),
    };
    Ok(Json(body))
}

/// PATCH /subscriptions/:id - edit subscription fields.
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdateSubscriptionCommand {
        subscription_id: SubscriptionId::from_uuid(id),
        valid_from: req.valid_from.map(Timestamp::from_datetime),
        valid_until: req.valid_until.map(Timestamp::from_datetime),
        status: req.status,
        amount_paid_cents: req.amount_paid_cents,
        paid_at: req.paid_at.map(Timestamp::from_datetime),
        payment_method: req.payment_method,
    };

    let result = state.update_subscription_handler().handle(command).await?;
    Ok(Json(SubscriptionResponse::from(result.subscription)))
}

/// DELETE /subscriptions/:id - remove a subscription without grants.
pub async fn remove_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .remove_subscription_handler()
        .handle(RemoveSubscriptionCommand {
            subscription_id: SubscriptionId::from_uuid(id),
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /subscriptions/:id/renew - renew into a fresh period.
pub async fn renew_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RenewSubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = RenewSubscriptionCommand {
        subscription_id: SubscriptionId::from_uuid(id),
        valid_from: req.valid_from.map(Timestamp::from_datetime),
        tier_id: req.tier_id.map(PriceTierId::from_uuid),
        amount_paid_cents: req.amount_paid_cents,
        paid_at: req.paid_at.map(Timestamp::from_datetime),
        payment_method: req.payment_method,
    };

    let result = state.renew_subscription_handler().handle(command).await?;
    let body = RenewSubscriptionResponse {
        subscription: result.subscription.into(),
        grants_extended: result.grants_extended,
        grants_created: result.grants_created,
    };
    Ok((StatusCode::CREATED, Json(body)))
}

/// POST /subscriptions/:id/terminate - end access early.
pub async fn terminate_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TerminateSubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = TerminateSubscriptionCommand {
        subscription_id: SubscriptionId::from_uuid(id),
        at: req.at.map(Timestamp::from_datetime),
    };

    let result = state
        .terminate_subscription_handler()
        .handle(command)
        .await?;
    let body = TerminateSubscriptionResponse {
        subscription: result.subscription.into(),
        grants_shortened: result.grants_shortened,
    };
    Ok(Json(body))
}

// ════════════════════════════════════════════════════════════════════════════════
// Access Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /access - grant a client direct access to a service.
pub async fn grant_access(
    State(state): State<AppState>,
    Json(req): Json<GrantAccessRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = GrantAccessCommand {
        client_id: ClientId::from_uuid(req.client_id),
        service_id: ServiceId::from_uuid(req.service_id),
        subscription_id: req.subscription_id.map(SubscriptionId::from_uuid),
        from: Timestamp::from_datetime(req.valid_from),
        until: req.valid_until.map(Timestamp::from_datetime),
    };

    let result = state.grant_access_handler().handle(command).await?;
    Ok((
        StatusCode::CREATED,
        Json(AccessGrantResponse::from(result.grant)),
    ))
}

/// GET /access/check - evaluate whether a client may use a service.
pub async fn check_access(
    State(state): State<AppState>,
    Query(query): Query<CheckAccessQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CheckAccessCommand {
        client_id: ClientId::from_uuid(query.client_id),
        service_id: ServiceId::from_uuid(query.service_id),
        at: query.at.map(Timestamp::from_datetime),
    };

    let result = state.check_access_handler().handle(command).await?;
    let body = AccessCheckResponse {
        allowed: result.allowed,
        grant: result.grant.map(Into::into),
    };
    Ok(Json(body))
}

/// PATCH /access/:id - replace a grant's validity window.
pub async fn update_access_grant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAccessGrantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdateAccessGrantCommand {
        grant_id: AccessGrantId::from_uuid(id),
        from: Timestamp::from_datetime(req.valid_from),
        until: req.valid_until.map(Timestamp::from_datetime),
    };

    let result = state.update_access_grant_handler().handle(command).await?;
    Ok(Json(AccessGrantResponse::from(result.grant)))
}

/// DELETE /access/:id - revoke a grant entirely.
pub async fn revoke_access(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .revoke_access_handler()
        .handle(RevokeAccessCommand {
            grant_id: AccessGrantId::from_uuid(id),
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /clients/:id/services - services a client can currently use.
pub async fn list_active_services(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActiveAtQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let command = ListActiveServicesCommand {
        client_id: ClientId::from_uuid(id),
        at: query.at.map(Timestamp::from_datetime),
    };

    let result = state.list_active_services_handler().handle(command).await?;
    let body = ActiveServicesResponse {
        items: result
            .items
            .into_iter()
            .map(|item| ActiveServiceResponse {
                service: item.service.into(),
                grant: item.grant.into(),
            })
            .collect(),
    };
    Ok(Json(body))
}

/// GET /services/:id/clients - clients currently allowed into a service.
pub async fn list_active_clients(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActiveAtQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let command = ListActiveClientsCommand {
        service_id: ServiceId::from_uuid(id),
        at: query.at.map(Timestamp::from_datetime),
    };

    let result = state.list_active_clients_handler().handle(command).await?;
    let body = ActiveClientsResponse {
        items: result
            .items
            .into_iter()
            .map(|item| ActiveClientResponse {
                client: item.client.into(),
                grant: item.grant.into(),
            })
            .collect(),
    };
    Ok(Json(body))
}

// ════════════════════════════════════════════════════════════════════════════════
// Type/Service Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// PUT /subscription-types/:id/services - reconcile the grantable set.
pub async fn reconcile_type_services(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReconcileTypeServicesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = ReconcileTypeServicesCommand {
        type_id: SubscriptionTypeId::from_uuid(id),
        service_ids: req.service_ids.into_iter().map(ServiceId::from_uuid).collect(),
    };

    let result = state
        .reconcile_type_services_handler()
        .handle(command)
        .await?;
    let body = ReconcileTypeServicesResponse {
        added: result.added.iter().map(|id| id.to_string()).collect(),
        removed: result.removed.iter().map(|id| id.to_string()).collect(),
        unchanged: result.unchanged,
    };
    Ok(Json(body))
}

/// GET /subscription-types/:id/services - list the grantable set.
pub async fn list_type_services(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .list_type_services_handler()
        .handle(ListTypeServicesCommand {
            type_id: SubscriptionTypeId::from_uuid(id),
        })
        .await?;
    let body = TypeServicesResponse {
        services: result.services.into_iter().map(Into::into).collect(),
    };
    Ok(Json(body))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
pub struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let code = self.0.code;
        let status = if code.is_not_found() {
            StatusCode::NOT_FOUND
        } else if code.is_conflict() || code == ErrorCode::InvalidStateTransition {
            StatusCode::CONFLICT
        } else {
            match code {
                ErrorCode::ValidationFailed
                | ErrorCode::InvalidWindow
                | ErrorCode::ServiceDisabled
                | ErrorCode::SubscriptionNotActive
                | ErrorCode::SubscriptionMismatch => StatusCode::BAD_REQUEST,
                _ => {
                    tracing::error!(error = %self.0, "internal error while serving request");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        };

        let mut body = ErrorResponse::new(code.to_string(), self.0.message);
        body.details = self.0.details;
        (status, Json(body)).into_response()
    }
}
