use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::columns::{ColumnConfig, LineItemColumn, SortDirection, sort_line_items};
use crate::{
    BidAdjustments, BidRollup, Estimate, EstimateCommand, EstimateError, EstimateMetadata,
    EstimateSummary, LineItem, MarkupRates, Tag, TagBreakdowns,
};

#[derive(Clone)]
pub struct AppState {
    estimate: Arc<RwLock<Estimate>>,
}

impl AppState {
    pub fn new(estimate: Estimate) -> Self {
        Self {
            estimate: Arc::new(RwLock::new(estimate)),
        }
    }

    fn estimate(&self) -> Arc<RwLock<Estimate>> {
        self.estimate.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<EstimateError> for ApiError {
    fn from(value: EstimateError) -> Self {
        match value {
            EstimateError::ItemNotFound(_)
            | EstimateError::TagNotFound { .. }
            | EstimateError::TagIndexOutOfRange { .. }
            | EstimateError::ColumnNotConfigured(_) => ApiError::NotFound(value.to_string()),
            EstimateError::DuplicateItem(_) => ApiError::Conflict(value.to_string()),
            _ => ApiError::Invalid(value.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

/// Query string for the line item table: free-text search, comma-separated
/// tag filter and an optional sort column.
#[derive(Debug, Default, Deserialize)]
struct ItemQuery {
    search: Option<String>,
    tags: Option<String>,
    sort: Option<String>,
    direction: Option<SortDirection>,
}

#[derive(Debug, Default, Deserialize)]
struct TagQuery {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VisibilityPayload {
    visible: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metadata", get(get_metadata).put(update_metadata))
        .route("/rates", get(get_rates).put(update_rates))
        .route("/adjustments", get(get_adjustments).put(update_adjustments))
        .route("/columns", get(list_columns))
        .route("/columns/:key", put(update_column))
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/items/:id/tags", post(add_tag))
        .route(
            "/items/:id/tags/:index",
            put(update_tag).delete(remove_tag),
        )
        .route("/tags", get(list_tags))
        .route("/breakdowns", get(get_breakdowns))
        .route("/bid", get(get_bid))
        .route("/summary", get(get_summary))
        .route("/refresh", post(get_summary))
        .route("/commands", post(apply_command))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, estimate: Estimate) -> std::io::Result<()> {
    let state = AppState::new(estimate);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "estimate-tool HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_metadata(State(state): State<AppState>) -> Json<EstimateMetadata> {
    let estimate = state.estimate();
    let metadata = estimate.read().metadata().clone();
    Json(metadata)
}

async fn update_metadata(
    State(state): State<AppState>,
    Json(metadata): Json<EstimateMetadata>,
) -> Json<EstimateMetadata> {
    let estimate = state.estimate();
    estimate.write().set_metadata(metadata.clone());
    Json(metadata)
}

async fn get_rates(State(state): State<AppState>) -> Json<MarkupRates> {
    let estimate = state.estimate();
    let rates = *estimate.read().rates();
    Json(rates)
}

async fn update_rates(
    State(state): State<AppState>,
    Json(rates): Json<MarkupRates>,
) -> Result<Json<BidRollup>, ApiError> {
    let estimate = state.estimate();
    let rollup = {
        let mut guard = estimate.write();
        guard.set_rates(rates)?;
        guard.bid_rollup()
    };
    Ok(Json(rollup))
}

async fn get_adjustments(State(state): State<AppState>) -> Json<BidAdjustments> {
    let estimate = state.estimate();
    let adjustments = *estimate.read().adjustments();
    Json(adjustments)
}

async fn update_adjustments(
    State(state): State<AppState>,
    Json(adjustments): Json<BidAdjustments>,
) -> Json<BidRollup> {
    let estimate = state.estimate();
    let rollup = {
        let mut guard = estimate.write();
        guard.set_adjustments(adjustments);
        guard.bid_rollup()
    };
    Json(rollup)
}

async fn list_columns(State(state): State<AppState>) -> Json<Vec<ColumnConfig>> {
    let estimate = state.estimate();
    let columns = estimate.read().columns().to_vec();
    Json(columns)
}

async fn update_column(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<VisibilityPayload>,
) -> Result<Json<Vec<ColumnConfig>>, ApiError> {
    let column = LineItemColumn::from_key(&key)
        .ok_or_else(|| ApiError::not_found(format!("unknown column '{key}'")))?;
    let estimate = state.estimate();
    let columns = {
        let mut guard = estimate.write();
        if !guard.set_column_visibility(column, payload.visible) {
            return Err(ApiError::not_found(format!("column '{key}' is not configured")));
        }
        guard.columns().to_vec()
    };
    Ok(Json(columns))
}

async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemQuery>,
) -> Result<Json<Vec<LineItem>>, ApiError> {
    let sort = match query.sort.as_deref() {
        Some(key) => Some(
            LineItemColumn::from_key(key)
                .ok_or_else(|| ApiError::invalid(format!("unknown sort column '{key}'")))?,
        ),
        None => None,
    };
    let selected: Vec<String> = query
        .tags
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    let estimate = state.estimate();
    let guard = estimate.read();
    let mut items = guard.filter_items(query.search.as_deref().unwrap_or_default(), &selected);
    if let Some(column) = sort {
        sort_line_items(&mut items, column, query.direction.unwrap_or_default());
    }
    Ok(Json(items.into_iter().cloned().collect()))
}

async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> Result<Json<LineItem>, ApiError> {
    let estimate = state.estimate();
    let item = estimate.read().find_item(item_id).cloned();
    item.map(Json)
        .ok_or_else(|| ApiError::not_found(format!("line item {item_id} not found")))
}

async fn create_item(
    State(state): State<AppState>,
    Json(item): Json<LineItem>,
) -> Result<(StatusCode, Json<LineItem>), ApiError> {
    let estimate = state.estimate();
    let created = estimate.write().insert_item(item)?.clone();
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
    Json(item): Json<LineItem>,
) -> Result<Json<LineItem>, ApiError> {
    if item.id != item_id {
        return Err(ApiError::invalid(
            "line item id in payload does not match path parameter",
        ));
    }
    let estimate = state.estimate();
    let updated = {
        let mut guard = estimate.write();
        if guard.find_item(item_id).is_none() {
            return Err(ApiError::not_found(format!("line item {item_id} not found")));
        }
        guard.upsert_item(item)?.clone()
    };
    Ok(Json(updated))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let estimate = state.estimate();
    let removed = estimate.write().delete_item(item_id);
    if !removed {
        return Err(ApiError::not_found(format!("line item {item_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn add_tag(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
    Json(tag): Json<Tag>,
) -> Result<(StatusCode, Json<LineItem>), ApiError> {
    let estimate = state.estimate();
    let updated = estimate.write().add_tag(item_id, tag)?.clone();
    Ok((StatusCode::CREATED, Json(updated)))
}

async fn update_tag(
    State(state): State<AppState>,
    Path((item_id, index)): Path<(i32, usize)>,
    Json(tag): Json<Tag>,
) -> Result<Json<LineItem>, ApiError> {
    let estimate = state.estimate();
    let updated = estimate.write().update_tag(item_id, index, tag)?.clone();
    Ok(Json(updated))
}

async fn remove_tag(
    State(state): State<AppState>,
    Path((item_id, index)): Path<(i32, usize)>,
) -> Result<Json<LineItem>, ApiError> {
    let estimate = state.estimate();
    let updated = estimate.write().remove_tag_at(item_id, index)?.clone();
    Ok(Json(updated))
}

async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<TagQuery>,
) -> Json<Vec<String>> {
    let estimate = state.estimate();
    let guard = estimate.read();
    let names = match query.q.as_deref() {
        Some(term) => guard.search_tags(term),
        None => guard.tag_names(),
    };
    Json(names)
}

async fn get_breakdowns(State(state): State<AppState>) -> Json<TagBreakdowns> {
    let estimate = state.estimate();
    let breakdowns = estimate.read().tag_breakdowns();
    Json(breakdowns)
}

async fn get_bid(State(state): State<AppState>) -> Json<BidRollup> {
    let estimate = state.estimate();
    let rollup = estimate.read().bid_rollup();
    Json(rollup)
}

async fn get_summary(State(state): State<AppState>) -> Json<EstimateSummary> {
    let estimate = state.estimate();
    let summary = estimate.read().summary();
    Json(summary)
}

async fn apply_command(
    State(state): State<AppState>,
    Json(command): Json<EstimateCommand>,
) -> Result<Json<EstimateSummary>, ApiError> {
    let estimate = state.estimate();
    let summary = estimate.write().apply(command)?;
    Ok(Json(summary))
}
