//! HTTP query surface over the materialized corpus.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/games?page=P&size=S` | Page of corpus game ids (defaults `P=1`, `S=10`) |
//! | `GET`  | `/api/games/ids/{id}` | First game whose title ends with `id` |
//! | `GET`  | `/api/games/date/{date}` | Games whose date starts with `date` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Errors are a JSON object with a single message:
//!
//! ```json
//! { "error": "Game 42 not found" }
//! ```
//!
//! `400` for paging parameters below 1 or an undecodable path, `404` when
//! nothing matches (including non-numeric ids), `503` while no corpus has
//! been written yet, `500` for an unreadable corpus. Non-integer `page` or
//! `size` values fall back to their defaults.
//!
//! The corpus file is read on every request. A refresh replaces it
//! atomically, so each request sees one complete version.

use anyhow::Context;
use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::corpus::parse_corpus;
use crate::models::{CorpusEntry, GameRecord};
use crate::query::{find_by_date_prefix, find_by_title_suffix, paginate, GamePage};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    corpus_path: Arc<PathBuf>,
}

/// Start the query server on the configured address (`PORT` overrides the port).
pub async fn run_server(
    config: &Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = config.server.bind_addr()?;
    run_server_on(addr, config.corpus.path.clone(), shutdown).await
}

pub async fn run_server_on(
    addr: SocketAddr,
    corpus_path: PathBuf,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = router(corpus_path);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("query server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("query server stopped");
    Ok(())
}

pub fn router(corpus_path: PathBuf) -> Router {
    let state = AppState {
        corpus_path: Arc::new(corpus_path),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/games", get(handle_list_games))
        .route("/api/games/ids/{id}", get(handle_game_by_id))
        .route("/api/games/date/{date}", get(handle_games_by_date))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        message: message.into(),
    }
}

fn unavailable(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

async fn load(state: &AppState) -> Result<Vec<CorpusEntry>, AppError> {
    let bytes = match tokio::fs::read(state.corpus_path.as_ref()).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(unavailable("Corpus not available yet"));
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to read corpus");
            return Err(internal("Failed to read corpus"));
        }
    };
    parse_corpus(&bytes).map_err(|e| {
        tracing::error!(error = %e, "failed to parse corpus");
        internal("Failed to parse corpus")
    })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/games ============

/// Raw query values. Anything that is not an integer falls back to the
/// default, so only explicit values below 1 are rejected.
#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<String>,
    size: Option<String>,
}

fn int_param(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

async fn handle_list_games(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<GamePage>, AppError> {
    let page = int_param(params.page.as_deref(), 1);
    let size = int_param(params.size.as_deref(), 10);
    if page < 1 || size < 1 {
        return Err(bad_request("page and size must be positive integers"));
    }

    let entries = load(&state).await?;
    let page = paginate(&entries, page as usize, size as usize)
        .map_err(|e| bad_request(e.to_string()))?;
    Ok(Json(page))
}

// ============ GET /api/games/ids/{id} ============

async fn handle_game_by_id(
    State(state): State<AppState>,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<Json<GameRecord>, AppError> {
    let Path(raw_id) = raw_id.map_err(|e| bad_request(e.body_text()))?;
    // Non-numeric ids cannot match any game.
    let id: u32 = raw_id
        .parse()
        .map_err(|_| not_found(format!("Game {} not found", raw_id)))?;
    let entries = load(&state).await?;
    find_by_title_suffix(&entries, id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(format!("Game {} not found", id)))
}

// ============ GET /api/games/date/{date} ============

async fn handle_games_by_date(
    State(state): State<AppState>,
    date: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<GameRecord>>, AppError> {
    let Path(date) = date.map_err(|e| bad_request(e.body_text()))?;
    let entries = load(&state).await?;
    let games: Vec<GameRecord> = find_by_date_prefix(&entries, &date)
        .into_iter()
        .cloned()
        .collect();
    if games.is_empty() {
        return Err(not_found(format!("No games found for date {}", date)));
    }
    Ok(Json(games))
}
