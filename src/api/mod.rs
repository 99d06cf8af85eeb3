//! REST layer over the orchestrator and the query service
//!
//! Routes are thin: they call into the core and serialize its results.

use crate::crawler::{ControlResult, Orchestrator};
use crate::output::HealthReport;
use crate::query::QueryService;
use crate::record::BookRecord;
use crate::state::ScrapeRun;
use crate::storage::RecordStore;
use crate::CrawlError;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub query: QueryService,
    pub store: Arc<dyn RecordStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, store: Arc<dyn RecordStore>) -> Self {
        Self {
            orchestrator,
            query: QueryService::new(Arc::clone(&store)),
            store,
            started_at: Instant::now(),
        }
    }
}

/// Error body returned by every failing route
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Maps core errors onto HTTP responses
pub struct ApiError(CrawlError);

impl From<CrawlError> for ApiError {
    fn from(e: CrawlError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CrawlError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => {
                tracing::error!("Request failed: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    title: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    categories: Vec<String>,
}

/// Builds the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/scraper/start", get(start_handler))
        .route("/api/v1/scraper/status", get(status_handler))
        .route("/api/v1/scraper/reset", get(reset_handler))
        .route("/api/v1/books", get(titles_handler))
        .route("/api/v1/books/search", get(search_handler))
        .route("/api/v1/books/categories", get(categories_handler))
        .route("/api/v1/books/:id", get(book_handler))
        .route("/api/v1/health", get(health_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

/// Runs a store-reading call on the blocking pool
///
/// Every record read goes through the file store, so none of it runs on the
/// async workers.
async fn off_runtime<T, F>(state: AppState, call: F) -> Result<T, ApiError>
where
    F: FnOnce(AppState) -> Result<T, CrawlError> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || call(state))
        .await
        .map_err(CrawlError::from)?;
    Ok(result?)
}

async fn start_handler(Extension(state): Extension<AppState>) -> ApiResult<ControlResult> {
    let started = off_runtime(state, |state| state.orchestrator.start()).await?;
    Ok(Json(started))
}

async fn status_handler(Extension(state): Extension<AppState>) -> Json<ScrapeRun> {
    Json(state.orchestrator.status())
}

async fn reset_handler(Extension(state): Extension<AppState>) -> ApiResult<ControlResult> {
    Ok(Json(state.orchestrator.reset().await?))
}

async fn titles_handler(Extension(state): Extension<AppState>) -> ApiResult<Vec<String>> {
    let titles = off_runtime(state, |state| state.query.list_titles()).await?;
    Ok(Json(titles))
}

async fn search_handler(
    Extension(state): Extension<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<BookRecord>> {
    let found = off_runtime(state, move |state| {
        state
            .query
            .search(params.title.as_deref(), params.category.as_deref())
    })
    .await?;
    Ok(Json(found))
}

async fn categories_handler(
    Extension(state): Extension<AppState>,
) -> ApiResult<CategoriesResponse> {
    let categories = off_runtime(state, |state| state.query.list_categories()).await?;
    Ok(Json(CategoriesResponse { categories }))
}

async fn book_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<BookRecord> {
    let book = off_runtime(state, move |state| state.query.get_by_id(id)).await?;
    Ok(Json(book))
}

async fn health_handler(Extension(state): Extension<AppState>) -> ApiResult<HealthReport> {
    let report = off_runtime(state, |state| {
        let run = state.orchestrator.status();
        HealthReport::collect(state.started_at.elapsed(), &run, state.store.as_ref())
            .map_err(CrawlError::from)
    })
    .await?;
    Ok(Json(report))
}
