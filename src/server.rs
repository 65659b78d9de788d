//! HTTP API server.
//!
//! Exposes the bot lifecycle and chat operations as a JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method   | Path | Description |
//! |----------|------|-------------|
//! | `POST`   | `/bots` | Create a bot for a website (idempotent per URL) |
//! | `POST`   | `/bots/{bot_id}/refresh` | Re-ingest a bot's website |
//! | `DELETE` | `/bots/{bot_id}` | Delete a bot and its index storage |
//! | `POST`   | `/chat/{bot_id}` | Ask a ready bot a question |
//! | `GET`    | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bot_not_ready", "message": "bot abc is not ready (status: processing)" } }
//! ```
//!
//! Codes: `bad_request` (400), `bot_not_ready` (400), `not_found` (404),
//! `quota_exhausted` (429), `ingestion_failed` (500), `no_context` (500),
//! `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-embedded
//! chat widgets can call the API cross-origin.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::chat::chat;
use crate::config::Config;
use crate::embedding::{create_embedder, EmbeddingGateway};
use crate::error::BotError;
use crate::generate::{create_generator, AnswerGateway};
use crate::index::VectorIndex;
use crate::ingest::{create_bot, delete_bot, refresh_bot};
use crate::models::{Bot, ChatAnswer};
use crate::normalize::Normalizer;
use crate::store::BotStore;
use crate::{db, migrate};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: BotStore,
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingGateway>,
    generator: Arc<dyn AnswerGateway>,
    normalizer: Arc<Normalizer>,
}

/// Start the HTTP server on the configured bind address.
///
/// Connects the bot registry, runs migrations, and builds the provider
/// gateways once; they are shared across requests.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let pool = db::connect(config).await?;
    migrate::run_migrations(&pool).await?;

    let state = AppState {
        store: BotStore::new(pool),
        index: Arc::new(VectorIndex::new(config.index.root.clone())),
        embedder: create_embedder(&config.embedding)?,
        generator: create_generator(&config.generation)?,
        normalizer: Arc::new(Normalizer::new(&config.cleaning)?),
        config: Arc::new(config.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/bots", post(handle_create_bot))
        .route("/bots/{bot_id}/refresh", post(handle_refresh_bot))
        .route("/bots/{bot_id}", delete(handle_delete_bot))
        .route("/chat/{bot_id}", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    info!(addr = %bind_addr, "server listening");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<BotError> for AppError {
    fn from(err: BotError) -> Self {
        let (status, code) = match &err {
            BotError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            BotError::NotReady { .. } => (StatusCode::BAD_REQUEST, "bot_not_ready"),
            BotError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            BotError::Quota(_) => (StatusCode::TOO_MANY_REQUESTS, "quota_exhausted"),
            BotError::Crawl { .. } | BotError::EmptyContent { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "ingestion_failed")
            }
            BotError::NoContext(_) => (StatusCode::INTERNAL_SERVER_ERROR, "no_context"),
            BotError::Index(_) | BotError::Provider(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
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

// ============ POST /bots ============

#[derive(Deserialize)]
struct CreateBotRequest {
    website_url: String,
}

#[derive(Serialize)]
struct BotResponse {
    bot_id: String,
    chat_url: String,
    status: String,
}

impl From<Bot> for BotResponse {
    fn from(bot: Bot) -> Self {
        Self {
            chat_url: format!("/chat/{}", bot.id),
            status: bot.status.to_string(),
            bot_id: bot.id,
        }
    }
}

async fn handle_create_bot(
    State(state): State<AppState>,
    Json(payload): Json<CreateBotRequest>,
) -> Result<Json<BotResponse>, AppError> {
    if payload.website_url.trim().is_empty() {
        return Err(bad_request("website_url must not be empty"));
    }

    let bot = create_bot(
        &state.config,
        &state.store,
        &state.index,
        state.embedder.as_ref(),
        &state.normalizer,
        &payload.website_url,
    )
    .await?;

    Ok(Json(bot.into()))
}

// ============ POST /bots/{bot_id}/refresh ============

async fn handle_refresh_bot(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
) -> Result<Json<BotResponse>, AppError> {
    let bot = refresh_bot(
        &state.config,
        &state.store,
        &state.index,
        state.embedder.as_ref(),
        &state.normalizer,
        &bot_id,
    )
    .await?;

    Ok(Json(bot.into()))
}

// ============ DELETE /bots/{bot_id} ============

#[derive(Serialize)]
struct DeletedResponse {
    bot_id: String,
    deleted: bool,
}

async fn handle_delete_bot(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
) -> Result<Json<DeletedResponse>, AppError> {
    delete_bot(&state.store, &state.index, &bot_id).await?;
    Ok(Json(DeletedResponse {
        bot_id,
        deleted: true,
    }))
}

// ============ POST /chat/{bot_id} ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
    source_chunks: Vec<SourceChunkResponse>,
}

#[derive(Serialize)]
struct SourceChunkResponse {
    text: String,
    page_url: String,
}

impl From<ChatAnswer> for ChatResponse {
    fn from(answer: ChatAnswer) -> Self {
        Self {
            answer: answer.answer,
            source_chunks: answer
                .sources
                .into_iter()
                .map(|s| SourceChunkResponse {
                    text: s.text,
                    page_url: s.page_url,
                })
                .collect(),
        }
    }
}

async fn handle_chat(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if payload.message.trim().is_empty() {
        return Err(bad_request("message must not be empty"));
    }

    let answer = chat(
        &state.config,
        &state.store,
        &state.index,
        state.embedder.as_ref(),
        state.generator.as_ref(),
        &bot_id,
        &payload.message,
    )
    .await?;

    Ok(Json(answer.into()))
}
