//! HTTP surface for the knowledge base.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /api/kb/init` – Load the corpus, chunk and embed it, and install the
//!   resulting index snapshot. Returns the indexed document and chunk counts.
//! - `GET /api/kb/status` – Report readiness, counts, and the build timestamp.
//! - `POST /api/kb/search` – Plain similarity search over the whole index.
//! - `POST /api/kb/advanced` – Planned search: the query is translated and
//!   filtered by the generation provider before ranking, with a fallback to the
//!   full index when the filters match nothing.
//! - `GET /metrics` – Observe build and search counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery.
//!
//! Handlers are generic over [`RetrievalApi`], so tests can exercise routing and
//! serialization against a stub service with no provider traffic.

use crate::index::{IndexStatus, IndexSummary};
use crate::metrics::MetricsSnapshot;
use crate::planner::PlanFilters;
use crate::retrieval::{AdvancedSearchOutcome, RetrievalApi, RetrievalError};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the knowledge-base API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: RetrievalApi + 'static,
{
    Router::new()
        .route("/api/kb/init", post(init_knowledge_base::<S>))
        .route("/api/kb/status", get(get_status::<S>))
        .route("/api/kb/search", post(search::<S>))
        .route("/api/kb/advanced", post(advanced_search::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Success response for the `POST /api/kb/init` endpoint.
#[derive(Serialize)]
struct InitResponse {
    /// Always `"ready"`; a failed build returns an error body instead.
    status: &'static str,
    /// Number of documents indexed.
    documents: usize,
    /// Number of chunks indexed.
    chunks: usize,
}

/// Rebuild the index from the configured corpus.
///
/// The previous snapshot keeps serving searches until the new one is installed,
/// and stays installed if this build fails.
async fn init_knowledge_base<S>(
    State(service): State<Arc<S>>,
) -> Result<Json<InitResponse>, AppError>
where
    S: RetrievalApi,
{
    let IndexSummary { documents, chunks } = service.build_index().await?;
    tracing::info!(documents, chunks, "Init request completed");
    Ok(Json(InitResponse {
        status: "ready",
        documents,
        chunks,
    }))
}

/// Response body for `GET /api/kb/status`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    /// Whether a snapshot is installed and searches can be served.
    ready: bool,
    /// Documents in the current snapshot (0 when not ready).
    documents: usize,
    /// Chunks in the current snapshot (0 when not ready).
    chunks: usize,
    /// RFC 3339 build timestamp, `null` when not ready.
    built_at: Option<String>,
}

/// Report index readiness and counts.
async fn get_status<S>(State(service): State<Arc<S>>) -> Json<StatusResponse>
where
    S: RetrievalApi,
{
    let IndexStatus {
        ready,
        documents,
        chunks,
        built_at,
    } = service.status();
    Json(StatusResponse {
        ready,
        documents,
        chunks,
        built_at,
    })
}

/// Request body shared by the `POST /api/kb/search` and `POST /api/kb/advanced`
/// endpoints.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    /// Query text; must contain at least one non-whitespace character.
    query: String,
    /// Optional result count; negative values are treated as zero.
    #[serde(default)]
    top_k: Option<i64>,
}

impl SearchRequest {
    fn top_k(&self) -> Option<usize> {
        self.top_k.map(|raw| usize::try_from(raw).unwrap_or(0))
    }
}

/// One result row in the `POST /api/kb/search` response.
#[derive(Serialize)]
struct SearchResultBody {
    id: String,
    title: String,
    text: String,
    score: f64,
}

/// Success response for the `POST /api/kb/search` endpoint.
#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResultBody>,
}

/// Run a plain similarity search over the whole index.
async fn search<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError>
where
    S: RetrievalApi,
{
    let hits = service.search(&request.query, request.top_k()).await?;
    let results = hits
        .into_iter()
        .map(|hit| SearchResultBody {
            id: hit.id,
            title: hit.title,
            text: hit.text,
            score: hit.score,
        })
        .collect();
    Ok(Json(SearchResponse { results }))
}

/// Filter block echoed back by the `POST /api/kb/advanced` endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FiltersBody {
    doc_ids: Vec<String>,
    tags: Vec<String>,
    must_include: Vec<String>,
    exclude: Vec<String>,
}

impl From<PlanFilters> for FiltersBody {
    fn from(filters: PlanFilters) -> Self {
        Self {
            doc_ids: filters.doc_ids,
            tags: filters.tags,
            must_include: filters.must_include,
            exclude: filters.exclude,
        }
    }
}

/// Planner outcome block in the `POST /api/kb/advanced` response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslationBody {
    /// Detected query language, `null` when the planner omitted it.
    language: Option<String>,
    /// Query text that was actually embedded.
    translated_query: String,
    /// Normalized filters the planner proposed.
    filters: FiltersBody,
    /// Whether the filters matched nothing and the full index was ranked.
    used_fallback: bool,
}

/// One result row in the `POST /api/kb/advanced` response.
#[derive(Serialize)]
struct AdvancedResultBody {
    id: String,
    title: String,
    tags: Vec<String>,
    text: String,
    score: f64,
}

/// Success response for the `POST /api/kb/advanced` endpoint.
#[derive(Serialize)]
struct AdvancedSearchResponse {
    /// Original query as received.
    query: String,
    translation: TranslationBody,
    results: Vec<AdvancedResultBody>,
}

/// Run a planned search: translate, filter, fall back when empty, rank.
async fn advanced_search<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<AdvancedSearchResponse>, AppError>
where
    S: RetrievalApi,
{
    let top_k = request.top_k();
    let AdvancedSearchOutcome {
        language,
        effective_query,
        filters,
        used_fallback,
        results,
    } = service.advanced_search(&request.query, top_k).await?;
    let results = results
        .into_iter()
        .map(|hit| AdvancedResultBody {
            id: hit.id,
            title: hit.title,
            tags: hit.tags,
            text: hit.text,
            score: hit.score,
        })
        .collect();
    Ok(Json(AdvancedSearchResponse {
        query: request.query,
        translation: TranslationBody {
            language,
            translated_query: effective_query,
            filters: filters.into(),
            used_fallback,
        },
        results,
    }))
}

/// Return build and search counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: RetrievalApi,
{
    Json(service.metrics())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "init",
                method: "POST",
                path: "/api/kb/init",
                description: "Load the corpus, chunk and embed every document, and install the index. Response returns { \"status\": \"ready\", \"documents\": number, \"chunks\": number }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "status",
                method: "GET",
                path: "/api/kb/status",
                description: "Report whether the index is ready, its document and chunk counts, and the build timestamp.",
                request_example: None,
            },
            CommandDescriptor {
                name: "search",
                method: "POST",
                path: "/api/kb/search",
                description: "Rank the whole index by cosine similarity against the query embedding.",
                request_example: Some(json!({
                    "query": "How big should an emergency fund be?",
                    "topK": 5
                })),
            },
            CommandDescriptor {
                name: "advanced_search",
                method: "POST",
                path: "/api/kb/advanced",
                description: "Translate the query, apply planner filters before ranking, and fall back to the full index when the filters match nothing.",
                request_example: Some(json!({
                    "query": "¿Cuánto debería ahorrar para emergencias?",
                    "topK": 5
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return build and search counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError(RetrievalError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            RetrievalError::NotReady | RetrievalError::InvalidQuery => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<RetrievalError> for AppError {
    fn from(inner: RetrievalError) -> Self {
        Self(inner)
    }
}
