// Inbound message routing
//
// Resolves the sender's phone to a caregiver, classifies the body, and
// routes ACCEPT to claim arbitration and DECLINE to decline tracking.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use shiftcast_core::{IntentClassifier, MessageIntent};
use shiftcast_dispatch::{ClaimOutcome, DispatchError, Dispatcher};
use shiftcast_storage::InMemoryStore;

use crate::common::ErrorResponse;

/// An inbound reply from a caregiver's phone.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InboundMessageRequest {
    /// Sender phone number, matched against the roster.
    #[serde(rename = "from")]
    #[schema(example = "+15550001")]
    pub from_phone: String,
    /// Free-text message body, classified into an intent.
    #[schema(example = "yes")]
    pub body: String,
    /// The shift the reply refers to.
    pub shift_id: Uuid,
}

/// Outcome of processing an inbound reply.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InboundMessageResponse {
    /// "claimed", "already_claimed" or "not_claimed".
    #[schema(example = "claimed")]
    pub status: String,
    pub shift_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caregiver_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
    /// Classified intent, echoed for non-claim outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<MessageIntent>,
}

/// App state for inbound message routes
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<InMemoryStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub classifier: Arc<dyn IntentClassifier>,
}

/// Create inbound message routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/messages/inbound", post(inbound_message))
        .with_state(state)
}

/// POST /v1/messages/inbound - Process a caregiver's reply
#[utoipa::path(
    post,
    path = "/v1/messages/inbound",
    request_body = InboundMessageRequest,
    responses(
        (status = 200, description = "Reply processed", body = InboundMessageResponse),
        (status = 404, description = "Caregiver or shift not found", body = ErrorResponse)
    ),
    tag = "messages"
)]
pub async fn inbound_message(
    State(state): State<AppState>,
    Json(req): Json<InboundMessageRequest>,
) -> Result<Json<InboundMessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let caregiver = state
        .store
        .get_caregiver_by_phone(&req.from_phone)
        .ok_or_else(|| ErrorResponse::not_found("caregiver"))?;

    // Resolve the shift before classifying, so an unknown id 404s even for
    // unclassifiable bodies.
    if state.store.get_shift(req.shift_id).is_none() {
        return Err(ErrorResponse::not_found("shift"));
    }

    let intent = state.classifier.classify(&req.body).await;
    tracing::debug!(
        caregiver_id = %caregiver.id,
        shift_id = %req.shift_id,
        %intent,
        "inbound message classified"
    );

    match intent {
        MessageIntent::Accept => {
            let outcome = state
                .dispatcher
                .handle_accept(caregiver.id, req.shift_id)
                .map_err(|e| match e {
                    DispatchError::ShiftNotFound(_) => ErrorResponse::not_found("shift"),
                })?;

            let response = match outcome {
                ClaimOutcome::Claimed {
                    caregiver_id,
                    claimed_at,
                } => InboundMessageResponse {
                    status: "claimed".to_string(),
                    shift_id: req.shift_id,
                    caregiver_id: Some(caregiver_id),
                    claimed_at: Some(claimed_at),
                    intent: Some(intent),
                },
                ClaimOutcome::AlreadyClaimed => InboundMessageResponse {
                    status: "already_claimed".to_string(),
                    shift_id: req.shift_id,
                    caregiver_id: None,
                    claimed_at: None,
                    intent: Some(intent),
                },
            };
            Ok(Json(response))
        }
        MessageIntent::Decline => {
            state
                .dispatcher
                .handle_decline(caregiver.id, req.shift_id)
                .map_err(|e| match e {
                    DispatchError::ShiftNotFound(_) => ErrorResponse::not_found("shift"),
                })?;

            Ok(Json(not_claimed(req.shift_id, intent)))
        }
        MessageIntent::Unknown => Ok(Json(not_claimed(req.shift_id, intent))),
    }
}

fn not_claimed(shift_id: Uuid, intent: MessageIntent) -> InboundMessageResponse {
    InboundMessageResponse {
        status: "not_claimed".to_string(),
        shift_id,
        caregiver_id: None,
        claimed_at: None,
        intent: Some(intent),
    }
}
