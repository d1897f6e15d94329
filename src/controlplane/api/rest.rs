//! REST API Handlers
//!
//! Implements the REST endpoints for volumes, file shares, pools, docks and
//! profiles. Every body is wrapped in a `GenericResponse` envelope.

use crate::controlplane::ProvisionController;
use crate::error::{Error, ErrorCode};
use crate::model::{ProfileSpec, ResourceKind, ResourceSpec};
use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Volume or file share creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Size in GiB
    pub size: u64,
    #[serde(default)]
    pub availability_zone: String,
    #[serde(default)]
    pub profile_id: String,
    /// Optional placement hint
    #[serde(default)]
    pub pool_id: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl CreateResourceRequest {
    fn into_resource(self, kind: ResourceKind) -> ResourceSpec {
        let mut resource = ResourceSpec::new(kind, self.name, self.size);
        resource.description = self.description;
        resource.availability_zone = self.availability_zone;
        resource.profile_id = self.profile_id;
        resource.pool_id = self.pool_id;
        resource.metadata = self.metadata;
        resource
    }
}

/// Volume extension request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendVolumeRequest {
    /// New size in GiB
    pub new_size: u64,
}

/// Error part of the response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSpec {
    pub code: ErrorCode,
    pub description: String,
}

/// Response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorSpec>,
}

fn respond<T: Serialize>(status: StatusCode, result: T) -> Response {
    (
        status,
        Json(GenericResponse {
            result: Some(result),
            error: None,
        }),
    )
        .into_response()
}

fn fail(e: &Error) -> Response {
    let code = e.code();
    let status =
        StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(GenericResponse::<()> {
            result: None,
            error: Some(ErrorSpec {
                code,
                description: e.to_string(),
            }),
        }),
    )
        .into_response()
}

fn rejected(rejection: JsonRejection) -> Response {
    fail(&Error::ApiValidation(rejection.body_text()))
}

// =============================================================================
// REST Router
// =============================================================================

/// REST API router builder
pub struct RestRouter {
    controller: Arc<ProvisionController>,
}

impl RestRouter {
    pub fn new(controller: Arc<ProvisionController>) -> Self {
        Self { controller }
    }

    /// Build the Axum router
    pub fn build(self) -> Router {
        let state = AppState {
            controller: self.controller,
        };

        Router::new()
            // Volume endpoints
            .route("/v1/volumes", post(create_volume).get(list_volumes))
            .route("/v1/volumes/:id", get(get_volume).delete(delete_volume))
            .route("/v1/volumes/:id/extend", post(extend_volume))
            // File share endpoints
            .route("/v1/fileshares", post(create_file_share).get(list_file_shares))
            .route("/v1/fileshares/:id", get(get_file_share).delete(delete_file_share))
            // Pool and dock endpoints
            .route("/v1/pools", get(list_pools))
            .route("/v1/pools/:id", get(get_pool))
            .route("/v1/docks", get(list_docks))
            // Profile endpoints
            .route("/v1/profiles", post(create_profile).get(list_profiles))
            .route("/v1/profiles/:id", get(get_profile))
            // Health endpoints
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    controller: Arc<ProvisionController>,
}

// =============================================================================
// Resource Handlers
// =============================================================================

async fn create_resource(
    state: AppState,
    kind: ResourceKind,
    payload: Result<Json<CreateResourceRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => return rejected(rejection),
    };
    info!("Creating {}: {} ({} GiB)", kind, request.name, request.size);

    let resource = match state.controller.submit(request.into_resource(kind)).await {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    match state.controller.create_resource(kind, &resource.id).await {
        Ok(created) => respond(StatusCode::CREATED, created),
        Err(e) => {
            error!("Create {} {} failed: {}", kind, resource.id, e);
            fail(&e)
        }
    }
}

async fn list_resources(state: AppState, kind: ResourceKind) -> Response {
    match state.controller.store().list_resources(kind).await {
        Ok(resources) => respond(StatusCode::OK, resources),
        Err(e) => fail(&e),
    }
}

async fn get_resource(state: AppState, kind: ResourceKind, id: String) -> Response {
    match state.controller.store().get_resource(kind, &id).await {
        Ok(resource) => respond(StatusCode::OK, resource),
        Err(e) => fail(&e),
    }
}

async fn delete_resource(state: AppState, kind: ResourceKind, id: String) -> Response {
    info!("Deleting {}: {}", kind, id);
    match state.controller.delete_resource(kind, &id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => fail(&e),
    }
}

async fn create_volume(
    State(state): State<AppState>,
    payload: Result<Json<CreateResourceRequest>, JsonRejection>,
) -> Response {
    create_resource(state, ResourceKind::Volume, payload).await
}

async fn list_volumes(State(state): State<AppState>) -> Response {
    list_resources(state, ResourceKind::Volume).await
}

async fn get_volume(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    get_resource(state, ResourceKind::Volume, id).await
}

async fn delete_volume(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    delete_resource(state, ResourceKind::Volume, id).await
}

async fn extend_volume(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ExtendVolumeRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => return rejected(rejection),
    };
    match state.controller.extend_volume(&id, request.new_size).await {
        Ok(volume) => respond(StatusCode::OK, volume),
        Err(e) => fail(&e),
    }
}

async fn create_file_share(
    State(state): State<AppState>,
    payload: Result<Json<CreateResourceRequest>, JsonRejection>,
) -> Response {
    create_resource(state, ResourceKind::FileShare, payload).await
}

async fn list_file_shares(State(state): State<AppState>) -> Response {
    list_resources(state, ResourceKind::FileShare).await
}

async fn get_file_share(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    get_resource(state, ResourceKind::FileShare, id).await
}

async fn delete_file_share(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    delete_resource(state, ResourceKind::FileShare, id).await
}

// =============================================================================
// Pool, Dock and Profile Handlers
// =============================================================================

async fn list_pools(State(state): State<AppState>) -> Response {
    match state.controller.store().list_pools().await {
        Ok(pools) => respond(StatusCode::OK, pools),
        Err(e) => fail(&e),
    }
}

async fn get_pool(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.controller.store().get_pool(&id).await {
        Ok(pool) => respond(StatusCode::OK, pool),
        Err(e) => fail(&e),
    }
}

async fn list_docks(State(state): State<AppState>) -> Response {
    match state.controller.store().list_docks().await {
        Ok(docks) => respond(StatusCode::OK, docks),
        Err(e) => fail(&e),
    }
}

async fn create_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfileSpec>, JsonRejection>,
) -> Response {
    let Json(profile) = match payload {
        Ok(p) => p,
        Err(rejection) => return rejected(rejection),
    };
    if profile.name.trim().is_empty() {
        return fail(&Error::ApiValidation("profile name is required".into()));
    }
    match state.controller.store().create_profile(profile).await {
        Ok(created) => respond(StatusCode::CREATED, created),
        Err(e) => fail(&e),
    }
}

async fn list_profiles(State(state): State<AppState>) -> Response {
    match state.controller.store().list_profiles().await {
        Ok(profiles) => respond(StatusCode::OK, profiles),
        Err(e) => fail(&e),
    }
}

async fn get_profile(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.controller.store().get_profile(&id).await {
        Ok(profile) => respond(StatusCode::OK, profile),
        Err(e) => fail(&e),
    }
}

// =============================================================================
// Health
// =============================================================================

/// Health check
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Ready once discovery has registered at least one pool
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.store().list_pools().await {
        Ok(pools) if !pools.is_empty() => (StatusCode::OK, "ready"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "no pools discovered"),
    }
}
