// shiftcast API server: router assembly and shared context
//
// The AppContext is the one explicit bundle of process state (store,
// dispatcher, classifier), constructed in main (or a test) and handed to
// build_router; components never reach through globals.

pub mod caregivers;
pub mod common;
pub mod messages;
pub mod shifts;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use shiftcast_core::{Caregiver, IntentClassifier, MessageIntent, Shift};
use shiftcast_dispatch::Dispatcher;
use shiftcast_storage::InMemoryStore;

use common::{ErrorResponse, ListResponse};

/// Process-wide application context, passed explicitly into the router.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<InMemoryStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub classifier: Arc<dyn IntentClassifier>,
}

impl AppContext {
    pub fn new(
        store: Arc<InMemoryStore>,
        dispatcher: Arc<Dispatcher>,
        classifier: Arc<dyn IntentClassifier>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            classifier,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// GET /health - Health probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up")
    ),
    tag = "health"
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        caregivers::create_caregiver,
        caregivers::list_caregivers,
        shifts::create_shift,
        shifts::list_shifts,
        shifts::get_shift,
        shifts::fanout_shift,
        messages::inbound_message,
    ),
    components(
        schemas(
            Caregiver, Shift, MessageIntent,
            caregivers::CreateCaregiverRequest,
            shifts::CreateShiftRequest, shifts::FanoutResponse,
            messages::InboundMessageRequest, messages::InboundMessageResponse,
            ErrorResponse,
            ListResponse<Caregiver>,
            ListResponse<Shift>,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "caregivers", description = "Roster management endpoints"),
        (name = "shifts", description = "Shift management and fanout endpoints"),
        (name = "messages", description = "Inbound reply routing")
    ),
    info(
        title = "Shiftcast API",
        version = "0.1.0",
        description = "Staged shift notification: fanout, escalation and claim arbitration",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

/// Assemble the full application router.
pub fn build_router(ctx: &AppContext) -> Router {
    let caregivers_state = caregivers::AppState {
        store: ctx.store.clone(),
    };
    let shifts_state = shifts::AppState {
        store: ctx.store.clone(),
        dispatcher: ctx.dispatcher.clone(),
    };
    let messages_state = messages::AppState {
        store: ctx.store.clone(),
        dispatcher: ctx.dispatcher.clone(),
        classifier: ctx.classifier.clone(),
    };

    Router::new()
        .route("/health", get(health))
        .merge(caregivers::routes(caregivers_state))
        .merge(shifts::routes(shifts_state))
        .merge(messages::routes(messages_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}
