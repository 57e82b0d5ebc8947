//! HTTP server: the HTML shell plus the JSON API behind it.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Single-page UI |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/api/connect` | Open the shared database connection |
//! | `GET`  | `/api/connection_status` | `{connected, state, ...}` |
//! | `GET`  | `/api/hierarchy-models` | All hierarchy model names |
//! | `GET`  | `/api/search?query=` | Concept name search |
//! | `GET`  | `/api/concept/{id}` | Concept detail with grouped relationships |
//! | `GET`  | `/api/brain-search?query=` | Structure name/synonym search |
//! | `GET`  | `/api/brain-structure/{id}?hierarchy_model=` | Structure detail with lineage tree |
//!
//! Every `/api` route except `connect` and `connection_status` answers
//! `503 {"message": "Database not connected"}` until a connection exists.
//! `/` and `/health` never touch the database, so they answer `200` while
//! disconnected. Use `/api/connection_status` to see whether a store is open.
//! See [`crate::error`] for the full error contract.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the page can be
//! served from a separate dev server.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use brainlex_core::models::{ConceptDetail, ConceptHit, StructureDetail, StructureRef};
use brainlex_core::retrieval;
use brainlex_core::store::Store;

use crate::config::Config;
use crate::connection::{ConnectParams, ConnectionManager, ConnectionStatus, Connector, PgConnector};
use crate::error::ApiError;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    connections: Arc<ConnectionManager>,
}

impl AppState {
    pub fn new(config: Config, connector: Arc<dyn Connector>) -> Self {
        Self {
            config: Arc::new(config),
            connections: Arc::new(ConnectionManager::new(connector)),
        }
    }

    /// Runs one store call under `[db].query_timeout_secs`.
    async fn timed<T>(&self, call: impl Future<Output = anyhow::Result<T>>) -> Result<T, ApiError> {
        match tokio::time::timeout(self.config.db.query_timeout(), call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ApiError::Query(e)),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.config.db.query_timeout_secs,
                    "query timed out"
                );
                Err(ApiError::Timeout(self.config.db.query_timeout_secs))
            }
        }
    }
}

/// Builds the router for `state`. Exposed so embedders can mount it.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/connect", post(handle_connect))
        .route("/api/connection_status", get(handle_connection_status))
        .route("/api/hierarchy-models", get(handle_hierarchy_models))
        .route("/api/search", get(handle_concept_search))
        .route("/api/concept/{id}", get(handle_concept))
        .route("/api/brain-search", get(handle_structure_search))
        .route("/api/brain-structure/{id}", get(handle_structure))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server with the PostgreSQL connector.
///
/// Binds to `[server].bind` and runs until Ctrl-C, then closes the active
/// connection.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let connector = Arc::new(PgConnector::new(config.db.clone()));
    run_server_with_connector(config, connector).await
}

/// Like [`run_server`], but with a caller-supplied [`Connector`]. Tests use
/// this to serve in-memory stores.
pub async fn run_server_with_connector(
    config: &Config,
    connector: Arc<dyn Connector>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState::new(config.clone(), connector);
    let connections = state.connections.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "brainlex listening on http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down");
        })
        .await?;

    connections.disconnect().await;
    Ok(())
}

// ============ GET / and /health ============

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ Connection ============

#[derive(Serialize)]
struct ConnectResponse {
    status: &'static str,
    message: &'static str,
}

async fn handle_connect(
    State(state): State<AppState>,
    body: Result<Json<ConnectParams>, JsonRejection>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let Json(params) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
    state.connections.connect(&params).await?;
    Ok(Json(ConnectResponse {
        status: "success",
        message: "Connected to database successfully",
    }))
}

async fn handle_connection_status(State(state): State<AppState>) -> Json<ConnectionStatus> {
    Json(state.connections.status())
}

async fn handle_hierarchy_models(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let store = state.connections.store()?;
    let models = state.timed(store.hierarchy_models()).await?;
    Ok(Json(models))
}

// ============ Search ============

#[derive(Deserialize)]
struct SearchParams {
    query: Option<String>,
}

impl SearchParams {
    fn term(&self) -> Result<&str, ApiError> {
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => Ok(q),
            _ => Err(ApiError::Validation("query must not be empty".into())),
        }
    }
}

async fn handle_concept_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ConceptHit>>, ApiError> {
    let store = state.connections.store()?;
    let term = params.term()?;
    let hits = state
        .timed(store.search_concepts(term, state.config.search.limit))
        .await?;
    tracing::debug!(query = term, hits = hits.len(), "concept search");
    Ok(Json(hits))
}

async fn handle_structure_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<StructureRef>>, ApiError> {
    let store = state.connections.store()?;
    let term = params.term()?;
    let hits = state
        .timed(store.search_structures(term, state.config.search.limit))
        .await?;
    tracing::debug!(query = term, hits = hits.len(), "structure search");
    Ok(Json(hits))
}

// ============ Detail ============

async fn handle_concept(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConceptDetail>, ApiError> {
    let store: Arc<dyn Store> = state.connections.store()?;
    state
        .timed(retrieval::concept_detail(store.as_ref(), &id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Concept"))
}

#[derive(Deserialize)]
struct StructureParams {
    hierarchy_model: Option<String>,
}

async fn handle_structure(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<StructureParams>,
) -> Result<Json<StructureDetail>, ApiError> {
    let store: Arc<dyn Store> = state.connections.store()?;
    state
        .timed(retrieval::structure_detail(
            store.as_ref(),
            &id,
            params.hierarchy_model.as_deref(),
        ))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Brain structure"))
}
