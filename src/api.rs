//! REST API for the packing engine.
//!
//! Exposes container management, single-box placement, streamed batch
//! placement and statistics over HTTP. Uses Axum as the web framework and
//! supports CORS. All requests share one engine behind a mutex, so
//! placements are applied strictly one at a time.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, EngineConfig};
use crate::engine::{PackingEngine, PlacementOutcome};
use crate::error::{ContainerError, PlacementError, StatisticsError};
use crate::model::{Container, PlacedBox};
use crate::stats::Statistics;
use crate::types::Vec3;

#[derive(Clone)]
struct ApiState {
    engine: Arc<Mutex<PackingEngine>>,
    engine_config: EngineConfig,
}

impl ApiState {
    fn new(engine_config: EngineConfig) -> Self {
        let engine = PackingEngine::new(
            engine_config.packing_config(),
            engine_config.default_container(),
        );
        Self {
            engine: Arc::new(Mutex::new(engine)),
            engine_config,
        }
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>boxfit API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Dimensions of a container or a box as (width, height, depth).
#[derive(Deserialize, Clone, Copy, ToSchema)]
#[schema(example = json!({ "dims": [2.0, 2.0, 2.0] }))]
pub struct DimsRequest {
    #[schema(value_type = [f64; 3], example = json!([2.0, 2.0, 2.0]))]
    pub dims: (f64, f64, f64),
}

/// Boxes to place in arrival order.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "boxes": [
            { "dims": [2.0, 2.0, 2.0] },
            { "dims": [5.0, 5.0, 5.0] },
            { "dims": [3.0, 3.0, 3.0] }
        ]
    })
)]
pub struct BatchRequest {
    pub boxes: Vec<DimsRequest>,
}

/// Result of a single placement request.
///
/// `status` is `placed` or `no_space`; `placed` is only set for `placed`.
#[derive(Serialize, ToSchema)]
pub struct PlaceResponse {
    pub status: String,
    #[schema(nullable = true)]
    pub placed: Option<PlacedBox>,
    pub statistics: Statistics,
}

impl PlaceResponse {
    fn new(outcome: PlacementOutcome, statistics: Statistics) -> Self {
        match outcome {
            PlacementOutcome::Placed(placed) => Self {
                status: "placed".to_string(),
                placed: Some(placed),
                statistics,
            },
            PlacementOutcome::NoSpace => Self {
                status: "no_space".to_string(),
                placed: None,
                statistics,
            },
        }
    }
}

/// Full packing state for rendering.
#[derive(Serialize, ToSchema)]
pub struct StateResponse {
    pub container: Container,
    pub placed: Vec<PlacedBox>,
    pub statistics: Statistics,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    code: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, code: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    code: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, code, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        "invalid_json",
        err.to_string(),
    )
}

/// Everything that can go wrong while serving an engine request.
enum EngineFailure {
    Poisoned,
    Worker(String),
    Container(ContainerError),
    Placement(PlacementError),
    Statistics(StatisticsError),
}

impl From<PlacementError> for EngineFailure {
    fn from(err: PlacementError) -> Self {
        EngineFailure::Placement(err)
    }
}

impl From<StatisticsError> for EngineFailure {
    fn from(err: StatisticsError) -> Self {
        EngineFailure::Statistics(err)
    }
}

impl From<ContainerError> for EngineFailure {
    fn from(err: ContainerError) -> Self {
        EngineFailure::Container(err)
    }
}

impl IntoResponse for EngineFailure {
    fn into_response(self) -> Response {
        match self {
            EngineFailure::Poisoned => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Engine unavailable",
                "engine_poisoned",
                "A previous request panicked while holding the engine",
            ),
            EngineFailure::Worker(details) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Placement worker failed",
                "worker_failed",
                details,
            ),
            EngineFailure::Container(err) => error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid container configuration",
                "invalid_container",
                err.to_string(),
            ),
            EngineFailure::Placement(err) => {
                let status = match err {
                    PlacementError::InvalidDimensions(_) | PlacementError::ExceedsContainer { .. } => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    PlacementError::Cancelled | PlacementError::DeadlineExceeded(_) => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                };
                error_response(status, "Placement failed", err.code(), err.to_string())
            }
            EngineFailure::Statistics(err) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Statistics unavailable",
                "invalid_container",
                err.to_string(),
            ),
        }
    }
}

fn lock_engine(engine: &Mutex<PackingEngine>) -> Result<MutexGuard<'_, PackingEngine>, EngineFailure> {
    engine.lock().map_err(|_| {
        error!("❌ Engine mutex poisoned");
        EngineFailure::Poisoned
    })
}

fn state_response(engine: &PackingEngine) -> Result<StateResponse, EngineFailure> {
    let snapshot = engine.snapshot();
    Ok(StateResponse {
        container: snapshot.container,
        placed: snapshot.placed.to_vec(),
        statistics: engine.statistics()?,
    })
}

/// Events streamed by `/boxes/stream`.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PlacementEvent {
    /// A box was committed.
    BoxPlaced {
        index: usize,
        placed: PlacedBox,
        statistics: Statistics,
    },
    /// A box fits dimensionally but no position is free.
    NoSpace { index: usize, dims: Vec3 },
    /// A box was rejected before searching, or its search was aborted.
    BoxRejected {
        index: usize,
        dims: Vec3,
        reason_code: String,
        reason_text: String,
    },
    /// All boxes processed.
    Finished { placed: usize, unplaced: usize },
}

/// Places every box of a batch in order, reporting each step via `on_event`.
fn place_batch_with_progress(
    engine: &mut PackingEngine,
    engine_config: &EngineConfig,
    boxes: &[DimsRequest],
    mut on_event: impl FnMut(&PlacementEvent),
) {
    let mut placed_count = 0;
    let mut unplaced_count = 0;

    for (index, request) in boxes.iter().enumerate() {
        let (w, h, d) = request.dims;
        let size = Vec3::from(request.dims);
        let budget = engine_config.search_budget();
        let event = match engine.try_place_box_with_budget(w, h, d, &budget) {
            Ok(PlacementOutcome::Placed(placed)) => match engine.statistics() {
                Ok(statistics) => {
                    placed_count += 1;
                    PlacementEvent::BoxPlaced {
                        index,
                        placed,
                        statistics,
                    }
                }
                Err(err) => {
                    unplaced_count += 1;
                    PlacementEvent::BoxRejected {
                        index,
                        dims: size,
                        reason_code: "invalid_container".to_string(),
                        reason_text: err.to_string(),
                    }
                }
            },
            Ok(PlacementOutcome::NoSpace) => {
                unplaced_count += 1;
                PlacementEvent::NoSpace {
                    index,
                    dims: size,
                }
            }
            Err(err) => {
                unplaced_count += 1;
                PlacementEvent::BoxRejected {
                    index,
                    dims: size,
                    reason_code: err.code().to_string(),
                    reason_text: err.to_string(),
                }
            }
        };
        on_event(&event);
    }

    on_event(&PlacementEvent::Finished {
        placed: placed_count,
        unplaced: unplaced_count,
    });
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_get_container,
        handle_set_container,
        handle_reset_container,
        handle_place_box,
        handle_place_stream,
        handle_clear_boxes,
        handle_statistics,
        handle_state
    ),
    components(
        schemas(
            DimsRequest,
            BatchRequest,
            PlaceResponse,
            StateResponse,
            ErrorResponse,
            Container,
            PlacedBox,
            Vec3,
            Statistics
        )
    ),
    tags((name = "packing", description = "Endpoints for box placement"))
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/container", get(handle_get_container).put(handle_set_container))
        .route("/container/reset", post(handle_reset_container))
        .route("/boxes", post(handle_place_box).delete(handle_clear_boxes))
        .route("/boxes/stream", post(handle_place_stream))
        .route("/statistics", get(handle_statistics))
        .route("/state", get(handle_state))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, engine_config: EngineConfig) {
    let app = router(ApiState::new(engine_config));

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("❌ Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    let display_host = config.display_host().to_string();
    info!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("📦 API Endpoints:");
    info!("   - GET|PUT /container, POST /container/reset");
    info!("   - POST|DELETE /boxes, POST /boxes/stream");
    info!("   - GET /statistics, GET /state");
    info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        error!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for GET /container.
#[utoipa::path(
    get,
    path = "/container",
    responses((status = 200, description = "Current container", body = Container)),
    tag = "packing"
)]
async fn handle_get_container(State(state): State<ApiState>) -> Response {
    match lock_engine(&state.engine) {
        Ok(engine) => (StatusCode::OK, Json(*engine.container())).into_response(),
        Err(failure) => failure.into_response(),
    }
}

/// Handler for PUT /container.
///
/// Replaces the container and removes all placed boxes.
#[utoipa::path(
    put,
    path = "/container",
    request_body = DimsRequest,
    responses(
        (status = 200, description = "Container replaced, boxes cleared", body = StateResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid container dimensions", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_set_container(
    State(state): State<ApiState>,
    payload: Result<Json<DimsRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let result = lock_engine(&state.engine).and_then(|mut engine| {
        let (w, h, d) = request.dims;
        engine.set_container(w, h, d)?;
        state_response(&engine)
    });
    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(failure) => failure.into_response(),
    }
}

/// Handler for POST /container/reset.
#[utoipa::path(
    post,
    path = "/container/reset",
    responses((status = 200, description = "Default container restored", body = StateResponse)),
    tag = "packing"
)]
async fn handle_reset_container(State(state): State<ApiState>) -> Response {
    let result = lock_engine(&state.engine).and_then(|mut engine| {
        engine.reset_container();
        state_response(&engine)
    });
    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(failure) => failure.into_response(),
    }
}

/// Handler for POST /boxes.
///
/// Searches a position for one box and commits it. Running out of space is
/// reported as `status: no_space` with 200 OK.
#[utoipa::path(
    post,
    path = "/boxes",
    request_body = DimsRequest,
    responses(
        (status = 200, description = "Box placed or no space left", body = PlaceResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid dimensions or box exceeds container", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Search deadline exceeded", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_place_box(
    State(state): State<ApiState>,
    payload: Result<Json<DimsRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let engine = Arc::clone(&state.engine);
    let budget = state.engine_config.search_budget();
    let joined = tokio::task::spawn_blocking(move || {
        let mut engine = lock_engine(&engine)?;
        let (w, h, d) = request.dims;
        let outcome = engine.try_place_box_with_budget(w, h, d, &budget)?;
        let statistics = engine.statistics()?;
        Ok::<_, EngineFailure>(PlaceResponse::new(outcome, statistics))
    })
    .await;

    match joined {
        Ok(Ok(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(Err(failure)) => failure.into_response(),
        Err(err) => EngineFailure::Worker(err.to_string()).into_response(),
    }
}

/// Handler for POST /boxes/stream (SSE).
///
/// Places the boxes in arrival order and streams one event per box as
/// Server-Sent Events, followed by a `Finished` event.
#[utoipa::path(
    post,
    path = "/boxes/stream",
    request_body = BatchRequest,
    responses(
        (
            status = 200,
            description = "Streams placement events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_place_stream(
    State(state): State<ApiState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    info!("📥 New batch: {} boxes", request.boxes.len());
    let (tx, rx) = mpsc::channel::<String>(32);
    let engine = Arc::clone(&state.engine);
    let engine_config = state.engine_config.clone();

    tokio::task::spawn_blocking(move || {
        let mut engine = match lock_engine(&engine) {
            Ok(engine) => engine,
            Err(_) => return,
        };
        place_batch_with_progress(&mut engine, &engine_config, &request.boxes, |evt| {
            match serde_json::to_string(evt) {
                // Receiver may have closed the stream; remaining events are discarded.
                Ok(json) => {
                    let _ = tx.blocking_send(json);
                }
                Err(err) => warn!("⚠️ Could not serialize placement event: {}", err),
            }
        });
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for DELETE /boxes.
#[utoipa::path(
    delete,
    path = "/boxes",
    responses((status = 200, description = "All boxes removed", body = Statistics)),
    tag = "packing"
)]
async fn handle_clear_boxes(State(state): State<ApiState>) -> Response {
    let result = lock_engine(&state.engine).and_then(|mut engine| {
        engine.clear_items();
        Ok(engine.statistics()?)
    });
    match result {
        Ok(statistics) => (StatusCode::OK, Json(statistics)).into_response(),
        Err(failure) => failure.into_response(),
    }
}

/// Handler for GET /statistics.
#[utoipa::path(
    get,
    path = "/statistics",
    responses((status = 200, description = "Current utilization", body = Statistics)),
    tag = "packing"
)]
async fn handle_statistics(State(state): State<ApiState>) -> Response {
    let result = lock_engine(&state.engine).and_then(|engine| Ok(engine.statistics()?));
    match result {
        Ok(statistics) => (StatusCode::OK, Json(statistics)).into_response(),
        Err(failure) => failure.into_response(),
    }
}

/// Handler for GET /state.
#[utoipa::path(
    get,
    path = "/state",
    responses((status = 200, description = "Container, placed boxes and statistics", body = StateResponse)),
    tag = "packing"
)]
async fn handle_state(State(state): State<ApiState>) -> Response {
    match lock_engine(&state.engine).and_then(|engine| state_response(&engine)) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(failure) => failure.into_response(),
    }
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
