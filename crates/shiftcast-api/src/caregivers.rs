// Caregiver roster HTTP routes

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use shiftcast_core::Caregiver;
use shiftcast_storage::{InMemoryStore, NewCaregiver};

use crate::common::{ErrorResponse, ListResponse};

/// Request to add a caregiver to the roster.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCaregiverRequest {
    #[schema(example = "Alice Ongwele")]
    pub name: String,
    /// Role qualification, matched against shifts' `role_required`.
    #[schema(example = "RN")]
    pub role: String,
    /// Phone number; must be unique across the roster since it routes
    /// inbound replies.
    #[schema(example = "+15550001")]
    pub phone: String,
}

/// App state for caregiver routes
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<InMemoryStore>,
}

/// Create caregiver routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/caregivers", post(create_caregiver).get(list_caregivers))
        .with_state(state)
}

/// POST /v1/caregivers - Add a caregiver to the roster
#[utoipa::path(
    post,
    path = "/v1/caregivers",
    request_body = CreateCaregiverRequest,
    responses(
        (status = 201, description = "Caregiver created", body = Caregiver),
        (status = 409, description = "Phone number already registered", body = ErrorResponse)
    ),
    tag = "caregivers"
)]
pub async fn create_caregiver(
    State(state): State<AppState>,
    Json(req): Json<CreateCaregiverRequest>,
) -> Result<(StatusCode, Json<Caregiver>), (StatusCode, Json<ErrorResponse>)> {
    let caregiver = state
        .store
        .create_caregiver(NewCaregiver {
            name: req.name,
            role: req.role,
            phone: req.phone,
        })
        .map_err(|e| {
            tracing::warn!("Failed to create caregiver: {}", e);
            ErrorResponse::new(e.to_string()).into_response(StatusCode::CONFLICT)
        })?;

    Ok((StatusCode::CREATED, Json(caregiver)))
}

/// GET /v1/caregivers - List the roster
#[utoipa::path(
    get,
    path = "/v1/caregivers",
    responses(
        (status = 200, description = "List of caregivers", body = ListResponse<Caregiver>)
    ),
    tag = "caregivers"
)]
pub async fn list_caregivers(State(state): State<AppState>) -> Json<ListResponse<Caregiver>> {
    Json(ListResponse::new(state.store.list_caregivers()))
}
