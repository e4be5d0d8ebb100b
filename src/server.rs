//! HTTP control API: axum router and request handlers.
//!
//! The server runs on the tokio async runtime while the render thread
//! runs on a plain `std::thread`. Mode changes travel over `std::sync::mpsc`;
//! status comes back through `Arc<Mutex<SignStatus>>`.
//!
//! ## Rust concepts
//! - axum extractors: `State`, `Json`, `Query`
//! - Serde `Deserialize` for parsing JSON request bodies
//! - `tower-http` middleware for CORS and request tracing

use crate::clock::SyncOutcome;
use crate::engine::CommitReport;
use crate::render::{SignCommand, SignStatus};
use crate::scheduler::Mode;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use serde::Deserialize;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Channel to send commands to the render thread
    pub command_tx: Sender<SignCommand>,
    /// Shared sign status (render thread writes, handlers read)
    pub status: Arc<Mutex<SignStatus>>,
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(get_status, get_frame_png, post_mode, post_mode_next, post_repaint),
    components(schemas(SignStatus, Mode, CommitReport, SyncOutcome, ModeRequest)),
    tags(
        (name = "sign", description = "Sign control endpoints"),
        (name = "system", description = "System status endpoints"),
    ),
    info(
        title = "Flipdot Sign API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP API for switching modes and inspecting a flipdot sign"
    )
)]
pub struct ApiDoc;

// ── Request types ────────────────────────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ModeRequest {
    /// Mode to switch to: "scroll" or "clock"
    #[schema(example = "clock")]
    mode: Mode,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PreviewParams {
    /// Pixels per dot in the preview image
    #[serde(default = "default_scale")]
    scale: u32,
}

fn default_scale() -> u32 {
    8
}

/// Largest preview scale accepted, in pixels per dot.
const MAX_PREVIEW_SCALE: u32 = 32;

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/frame.png", get(get_frame_png))
        .route("/api/v1/mode", post(post_mode))
        .route("/api/v1/mode/next", post(post_mode_next))
        .route("/api/v1/repaint", post(post_repaint))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /api/v1/status: return current sign state
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "system",
    responses(
        (status = 200, description = "Current sign status", body = SignStatus)
    )
)]
async fn get_status(State(state): State<AppState>) -> Result<Json<SignStatus>, (StatusCode, String)> {
    let status = state.status.lock().map_err(|_| status_unavailable())?.clone();
    Ok(Json(status))
}

/// GET /api/v1/frame.png: PNG preview of the dots as last written
#[utoipa::path(
    get,
    path = "/api/v1/frame.png",
    tag = "system",
    params(PreviewParams),
    responses(
        (status = 200, description = "PNG image of the actuated frame", content_type = "image/png"),
        (status = 400, description = "Scale out of range")
    )
)]
async fn get_frame_png(
    State(state): State<AppState>,
    Query(params): Query<PreviewParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if params.scale == 0 || params.scale > MAX_PREVIEW_SCALE {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("scale must be between 1 and {MAX_PREVIEW_SCALE}"),
        ));
    }

    let frame = state.status.lock().map_err(|_| status_unavailable())?.frame.clone();
    let png = frame.to_png(params.scale).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode preview: {e}"),
        )
    })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// POST /api/v1/mode: switch to a specific mode
#[utoipa::path(
    post,
    path = "/api/v1/mode",
    tag = "sign",
    request_body = ModeRequest,
    responses(
        (status = 200, description = "Mode change queued"),
    )
)]
async fn post_mode(
    State(state): State<AppState>,
    Json(req): Json<ModeRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    send(&state, SignCommand::SetMode(req.mode))?;
    Ok(Json(serde_json::json!({ "mode": req.mode })))
}

/// POST /api/v1/mode/next: advance to the next mode, like the front-panel button
#[utoipa::path(
    post,
    path = "/api/v1/mode/next",
    tag = "sign",
    responses(
        (status = 200, description = "Mode change queued"),
    )
)]
async fn post_mode_next(State(state): State<AppState>) -> Result<StatusCode, (StatusCode, String)> {
    send(&state, SignCommand::NextMode)?;
    Ok(StatusCode::OK)
}

/// POST /api/v1/repaint: repaint every dot on the next tick
#[utoipa::path(
    post,
    path = "/api/v1/repaint",
    tag = "sign",
    responses(
        (status = 200, description = "Full repaint queued"),
    )
)]
async fn post_repaint(State(state): State<AppState>) -> Result<StatusCode, (StatusCode, String)> {
    send(&state, SignCommand::Repaint)?;
    Ok(StatusCode::OK)
}

fn send(state: &AppState, cmd: SignCommand) -> Result<(), (StatusCode, String)> {
    state.command_tx.send(cmd).map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Render thread gone".to_string(),
        )
    })
}

fn status_unavailable() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Status unavailable".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc;

    fn state() -> (AppState, mpsc::Receiver<SignCommand>) {
        let (tx, rx) = mpsc::channel();
        let state = AppState {
            command_tx: tx,
            status: Arc::new(Mutex::new(SignStatus::new(16, 9))),
        };
        (state, rx)
    }

    #[test]
    fn mode_request_parses_lowercase_names() {
        let req: ModeRequest = serde_json::from_str(r#"{"mode":"clock"}"#).unwrap();
        assert_eq!(req.mode, Mode::Clock);
        assert!(serde_json::from_str::<ModeRequest>(r#"{"mode":"weather"}"#).is_err());
    }

    #[test]
    fn send_forwards_to_render_thread() {
        let (state, rx) = state();
        send(&state, SignCommand::NextMode).unwrap();
        assert_eq!(rx.try_recv().unwrap(), SignCommand::NextMode);
    }

    #[test]
    fn send_fails_when_render_thread_is_gone() {
        let (state, rx) = state();
        drop(rx);
        let (code, _) = send(&state, SignCommand::Repaint).unwrap_err();
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn mode_handler_queues_command() {
        let (state, rx) = state();
        let Json(body) = post_mode(
            State(state),
            Json(ModeRequest { mode: Mode::Clock }),
        )
        .await
        .unwrap();
        assert_eq!(body["mode"], "clock");
        assert_eq!(rx.try_recv().unwrap(), SignCommand::SetMode(Mode::Clock));
    }

    #[tokio::test]
    async fn preview_rejects_zero_scale() {
        let (state, _rx) = state();
        let result = get_frame_png(State(state), Query(PreviewParams { scale: 0 })).await;
        let Err((code, _)) = result else {
            panic!("zero scale should be rejected");
        };
        assert_eq!(code, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/status",
            "/api/v1/frame.png",
            "/api/v1/mode",
            "/api/v1/mode/next",
            "/api/v1/repaint",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
