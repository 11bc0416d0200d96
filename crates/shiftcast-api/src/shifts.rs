// Shift HTTP routes: creation, lookup and the fanout trigger

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use shiftcast_core::Shift;
use shiftcast_dispatch::{DispatchError, Dispatcher, FanoutOutcome};
use shiftcast_storage::{InMemoryStore, NewShift};

use crate::common::{ErrorResponse, ListResponse};

/// Request to create a shift.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateShiftRequest {
    pub organization_id: Uuid,
    /// Caregiver role required to qualify (e.g. "RN").
    #[schema(example = "RN")]
    pub role_required: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Response to a fanout trigger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FanoutResponse {
    pub shift_id: Uuid,
    /// "started" on the first trigger, "already_fanout" on any later one.
    #[schema(example = "started")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_required: Option<String>,
    /// How many caregivers were texted in round 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifying_caregivers: Option<usize>,
    pub fanout_started_at: DateTime<Utc>,
}

/// App state for shift routes
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<InMemoryStore>,
    pub dispatcher: Arc<Dispatcher>,
}

/// Create shift routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/shifts", post(create_shift).get(list_shifts))
        .route("/v1/shifts/:shift_id", get(get_shift))
        .route("/v1/shifts/:shift_id/fanout", post(fanout_shift))
        .with_state(state)
}

/// POST /v1/shifts - Create a shift
#[utoipa::path(
    post,
    path = "/v1/shifts",
    request_body = CreateShiftRequest,
    responses(
        (status = 201, description = "Shift created", body = Shift)
    ),
    tag = "shifts"
)]
pub async fn create_shift(
    State(state): State<AppState>,
    Json(req): Json<CreateShiftRequest>,
) -> (StatusCode, Json<Shift>) {
    let shift = state.store.create_shift(NewShift {
        organization_id: req.organization_id,
        role_required: req.role_required,
        start_time: req.start_time,
        end_time: req.end_time,
    });

    (StatusCode::CREATED, Json(shift))
}

/// GET /v1/shifts - List all shifts
#[utoipa::path(
    get,
    path = "/v1/shifts",
    responses(
        (status = 200, description = "List of shifts", body = ListResponse<Shift>)
    ),
    tag = "shifts"
)]
pub async fn list_shifts(State(state): State<AppState>) -> Json<ListResponse<Shift>> {
    Json(ListResponse::new(state.store.list_shifts()))
}

/// GET /v1/shifts/{shift_id} - Get shift by ID
#[utoipa::path(
    get,
    path = "/v1/shifts/{shift_id}",
    params(
        ("shift_id" = Uuid, Path, description = "Shift ID")
    ),
    responses(
        (status = 200, description = "Shift found", body = Shift),
        (status = 404, description = "Shift not found", body = ErrorResponse)
    ),
    tag = "shifts"
)]
pub async fn get_shift(
    State(state): State<AppState>,
    Path(shift_id): Path<Uuid>,
) -> Result<Json<Shift>, (StatusCode, Json<ErrorResponse>)> {
    state
        .store
        .get_shift(shift_id)
        .map(Json)
        .ok_or_else(|| ErrorResponse::not_found("shift"))
}

/// POST /v1/shifts/{shift_id}/fanout - Notify all qualifying caregivers
///
/// Idempotent: the first call texts the qualifying roster and schedules the
/// escalation; repeated calls report `already_fanout` and send nothing.
#[utoipa::path(
    post,
    path = "/v1/shifts/{shift_id}/fanout",
    params(
        ("shift_id" = Uuid, Path, description = "Shift ID")
    ),
    responses(
        (status = 200, description = "Fanout started or already done", body = FanoutResponse),
        (status = 404, description = "Shift not found", body = ErrorResponse)
    ),
    tag = "shifts"
)]
pub async fn fanout_shift(
    State(state): State<AppState>,
    Path(shift_id): Path<Uuid>,
) -> Result<Json<FanoutResponse>, (StatusCode, Json<ErrorResponse>)> {
    let outcome = state
        .dispatcher
        .start_fanout(shift_id)
        .await
        .map_err(|e| match e {
            DispatchError::ShiftNotFound(_) => ErrorResponse::not_found("shift"),
        })?;

    let response = match outcome {
        FanoutOutcome::Started {
            role_required,
            qualifying_caregivers,
            fanout_started_at,
        } => FanoutResponse {
            shift_id,
            status: "started".to_string(),
            role_required: Some(role_required),
            qualifying_caregivers: Some(qualifying_caregivers),
            fanout_started_at,
        },
        FanoutOutcome::AlreadyStarted { fanout_started_at } => FanoutResponse {
            shift_id,
            status: "already_fanout".to_string(),
            role_required: None,
            qualifying_caregivers: None,
            fanout_started_at,
        },
    };

    Ok(Json(response))
}
