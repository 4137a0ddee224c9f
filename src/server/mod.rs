//! Web server for the board API and realtime push.

pub mod websocket;

use axum::{
    Json, Router,
    extract::{Path as AxumPath, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tower_http::cors::CorsLayer;

use crate::backend::{Backend, ChangeEvent, Order};
use crate::config::{self, BoardConfig};
use crate::models::{NewComment, NewTicket, TicketPatch};
use crate::store::BoardStore;
use crate::sync::SyncChannel;

/// How many comments ride along with the ticket listing.
const RECENT_COMMENTS: usize = 50;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Backend handle (wrapped in a Mutex for thread safety)
    pub backend: Arc<Mutex<Backend>>,
    /// This server's board session, kept fresh by its sync channel
    pub store: Arc<Mutex<BoardStore>>,
    /// Broadcast channel for pushing change events to WebSocket clients
    pub update_tx: broadcast::Sender<ChangeEvent>,
    /// Board configuration (operator, roster)
    pub config: Arc<BoardConfig>,
}

/// Start the board server.
pub async fn start_server(
    board_config: BoardConfig,
    data_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = Backend::open(&data_dir.join(config::DB_FILE))?;
    let update_tx = backend.change_sender();
    let backend = Arc::new(Mutex::new(backend));
    let store = Arc::new(Mutex::new(BoardStore::new()));

    // Keep the server's own snapshot fresh for /api/board and mounted
    // GUI clients; torn down when the server exits
    let _sync = SyncChannel::start(backend.clone(), store.clone()).await;

    let host_addr: std::net::IpAddr = board_config
        .host
        .parse()
        .map_err(|e| format!("Invalid host address '{}': {}", board_config.host, e))?;
    let addr = SocketAddr::from((host_addr, board_config.port));

    let state = AppState {
        backend,
        store,
        update_tx,
        config: Arc::new(board_config),
    };
    let app = router(state);

    tracing::info!("Starting missionboard server at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/config", get(get_config))
        .route("/api/tickets", get(get_tickets).post(post_tickets))
        .route(
            "/api/tickets/{id}",
            axum::routing::patch(patch_ticket).delete(delete_ticket),
        )
        .route("/api/messages", get(get_messages))
        .route("/api/agents", get(get_agents))
        .route("/api/board", get(get_board))
        .route("/api/webhook/comment", post(comment_webhook))
        .route("/ws", get(websocket::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

/// Flat error surface: every backend failure becomes a generic 500.
fn internal_error<E: std::fmt::Display>(e: E) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

fn bad_request<E: std::fmt::Display>(e: E) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": e.to_string() })),
    )
}

/// Get configuration and build info.
async fn get_config(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "project": "missionboard",
        "operator": state.config.operator,
        "version": env!("CARGO_PKG_VERSION"),
        "build_timestamp": env!("MB_BUILD_TIMESTAMP"),
        "git_commit": env!("MB_GIT_COMMIT"),
    }))
}

/// Get all tickets (most recently updated first) plus the most recent
/// comments in one payload.
async fn get_tickets(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let backend = state.backend.lock().await;
    let tickets = backend.list_tickets(Order::Desc).map_err(internal_error)?;
    let comments = backend
        .list_comments(Order::Desc, Some(RECENT_COMMENTS))
        .map_err(internal_error)?;

    Ok(Json(json!({ "tickets": tickets, "comments": comments })))
}

/// Create a ticket or a comment, discriminated by the `type` field.
/// Creating a comment additionally touches its parent ticket.
async fn post_tickets(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let data = body.get("data").cloned().unwrap_or(Value::Null);

    match body.get("type").and_then(|t| t.as_str()) {
        Some("ticket") => {
            let new: NewTicket = serde_json::from_value(data).map_err(bad_request)?;
            let backend = state.backend.lock().await;
            let ticket = backend.insert_ticket(&new).map_err(internal_error)?;
            Ok(Json(serde_json::to_value(ticket).map_err(internal_error)?))
        }
        Some("comment") => {
            let new: NewComment = serde_json::from_value(data).map_err(bad_request)?;
            let backend = state.backend.lock().await;
            let comment = backend.insert_comment(&new).map_err(internal_error)?;
            // Second, non-transactional write: bump the parent's recency
            let _ = backend.touch_ticket(&new.ticket_id);
            Ok(Json(serde_json::to_value(comment).map_err(internal_error)?))
        }
        _ => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid type" })),
        )),
    }
}

/// Merge a partial field set into a ticket and stamp its update time.
async fn patch_ticket(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(patch): Json<TicketPatch>,
) -> Result<Json<Value>, ApiError> {
    let backend = state.backend.lock().await;
    let ticket = backend.update_ticket(&id, &patch).map_err(internal_error)?;
    Ok(Json(serde_json::to_value(ticket).map_err(internal_error)?))
}

/// Delete a ticket's comments, then the ticket. Not transactional.
async fn delete_ticket(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Value>, ApiError> {
    let backend = state.backend.lock().await;
    backend.delete_comments_for(&id).map_err(internal_error)?;
    backend.delete_ticket(&id).map_err(internal_error)?;
    Ok(Json(json!({ "success": true })))
}

/// Get all messages, oldest first.
async fn get_messages(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let backend = state.backend.lock().await;
    let messages = backend
        .list_messages(Order::Asc, None)
        .map_err(internal_error)?;
    Ok(Json(json!({ "messages": messages })))
}

/// Get the agent roster.
async fn get_agents(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "agents": state.config.agents }))
}

/// Get the server session's current board snapshot.
async fn get_board(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.lock().await;
    Json(json!({
        "version": store.version(),
        "board": store.snapshot(),
    }))
}

/// Webhook stub: log the payload and acknowledge.
async fn comment_webhook(payload: Result<Json<Value>, JsonRejection>) -> impl IntoResponse {
    match payload {
        Ok(Json(body)) => {
            tracing::info!(payload = %body, "New comment webhook");
            (
                StatusCode::OK,
                Json(json!({
                    "received": true,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })),
            )
        }
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid request" })),
        ),
    }
}
