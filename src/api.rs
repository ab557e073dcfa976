use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use shuttle_axum::axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::domain::GrandFilterRequest;
use crate::ingest::{HarvestMode, Harvester};
use crate::search::{parse_page_size, HintService, SearchService};

#[derive(Clone)]
pub struct AppState {
    pub search: SearchService,
    pub hints: HintService,
    pub harvester: Arc<Harvester>,
    /// Parent of every admin-triggered harvest; cancelled on shutdown.
    pub shutdown: CancellationToken,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/service/healthcheck", get(healthcheck))
        .route("/api/v1/grandFilter", post(grand_filter))
        .route("/api/v1/searchPublisherWithHints/", post(default_publishers))
        .route("/api/v1/searchPublisherWithHints/{search}", post(search_publishers))
        .route("/api/v1/searchLanguages", post(search_languages))
        .route("/api/v1/searchCategoryWithHints", post(search_categories))
        .route("/api/v1/searchPeopleWithHints", post(search_people))
        .route("/admin/harvest", post(admin_harvest))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `400 {message, error}`; the message says what the caller asked for.
#[derive(Debug)]
pub struct ApiError {
    message: String,
    error: String,
}

impl ApiError {
    fn new(message: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self {
            message: message.into(),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(target: "api", message = %self.message, error = %self.error, "request failed");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": self.message, "error": self.error })),
        )
            .into_response()
    }
}

fn ok_data<T: serde::Serialize>(data: T) -> Json<Value> {
    Json(json!({ "data": data, "message": "ok" }))
}

async fn healthcheck() -> Json<Value> {
    Json(json!({ "message": "ok" }))
}

async fn grand_filter(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let req: GrandFilterRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new("malformed request body", e))?;
    let size = parse_page_size(q.get("size").map(String::as_str));

    let result = state
        .search
        .search(&req, size)
        .await
        .map_err(|e| ApiError::new("could not search articles", e))?;

    Ok(Json(json!({
        "data": result.articles,
        "total": result.total,
        "message": "ok",
    })))
}

async fn default_publishers(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let hints = state
        .hints
        .publishers("")
        .await
        .map_err(|e| ApiError::new("could not list default publishers", e))?;
    Ok(ok_data(hints))
}

async fn search_publishers(
    State(state): State<AppState>,
    Path(search): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let hints = state
        .hints
        .publishers(&search)
        .await
        .map_err(|e| ApiError::new(format!("could not find publishers for {search}"), e))?;
    Ok(ok_data(hints))
}

async fn search_languages(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let langs = state
        .hints
        .languages()
        .await
        .map_err(|e| ApiError::new("could not list languages", e))?;
    Ok(ok_data(langs))
}

async fn search_categories(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let query = q.get("q").cloned().unwrap_or_default();
    let cats = state
        .hints
        .categories(&query)
        .await
        .map_err(|e| ApiError::new("could not find categories", e))?;
    Ok(ok_data(cats))
}

async fn search_people(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let query = q.get("q").cloned().unwrap_or_default();
    let people = state
        .hints
        .people(&query)
        .await
        .map_err(|e| ApiError::new("could not find people", e))?;
    Ok(ok_data(people))
}

/// Runs one harvest to completion and returns its report.
async fn admin_harvest(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let full = q
        .get("full")
        .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
    let mode = HarvestMode::from_full(full);
    tracing::info!(target: "api", mode = mode.as_str(), "harvest requested");

    let cancel = state.shutdown.child_token();
    let report = state
        .harvester
        .run(mode, &cancel)
        .await
        .map_err(|e| ApiError::new("harvest aborted", e))?;
    Ok(ok_data(report))
}
