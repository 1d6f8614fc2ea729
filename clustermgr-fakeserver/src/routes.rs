//! HTTP handlers for the event broker service endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use clustermgr_api::{
    CreateServiceRequest, DeleteOperation, Envelope, EventBrokerService, SERVICES_PATH,
    ServiceOperation, UpdateServiceRequest, validation,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::error::FakeServerError;
use crate::state::ServiceStore;

/// Shared application state
pub struct AppState {
    pub store: ServiceStore,
}

type ApiResult<T> = Result<T, FakeServerError>;

pub fn create_router(state: Arc<AppState>) -> Router {
    let item_path = format!("{}/{{id}}", SERVICES_PATH);
    let collection_slash = format!("{}/", SERVICES_PATH);

    Router::new()
        .route(SERVICES_PATH, post(create_service))
        .route(&collection_slash, post(create_service))
        .route(
            &item_path,
            get(get_service).patch(update_service).delete(delete_service),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer_token,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject requests whose bearer token does not match the configured one.
async fn require_bearer_token(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, FakeServerError> {
    if let Some(expected) = &state.store.config().bearer_token {
        let presented = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(expected.as_str()) {
            warn!(path = %req.uri().path(), "Rejected request with bad bearer token");
            return Err(FakeServerError::Unauthorized);
        }
    }
    Ok(next.run(req).await)
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Envelope<ServiceOperation>>)> {
    let req: CreateServiceRequest = validation::decode(&body).inspect_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(&body), "Rejected create request");
    })?;
    req.validate()?;

    let record = state.store.create(req).await;
    info!(id = %record.id, name = %record.name, "Service creation accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(Envelope::new(record.to_operation())),
    ))
}

pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<EventBrokerService>>> {
    let record = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| FakeServerError::NotFound(id.clone()))?;
    debug!(id = %id, state = %record.state, "GET service");
    Ok(Json(Envelope::new(record.to_service())))
}

pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Envelope<EventBrokerService>>> {
    let req: UpdateServiceRequest = validation::decode(&body).inspect_err(|e| {
        warn!(id = %id, error = %e, "Rejected update request");
    })?;
    req.validate()?;

    let record = state
        .store
        .update(&id, req)
        .await
        .ok_or_else(|| FakeServerError::NotFound(id.clone()))?;
    info!(id = %id, name = %record.name, "Service update accepted");

    Ok(Json(Envelope::new(record.to_service())))
}

pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<Envelope<DeleteOperation>>)> {
    let record = state
        .store
        .delete(&id)
        .await
        .ok_or_else(|| FakeServerError::NotFound(id.clone()))?;
    info!(id = %id, "Service deleted");

    Ok((
        StatusCode::ACCEPTED,
        Json(Envelope::new(record.to_delete_operation())),
    ))
}
