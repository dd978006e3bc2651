use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Assignment, BalanceSummary, Board, BoardError, BoardSnapshot, BoardStore, DependencyConflict,
    DropTarget, MoveRequest, QueuedItem, Resource, ResourceId, ThemeSummary, TimelineView, WorkItem,
    WorkItemDraft, WorkItemId,
};

pub struct AppState<S: BoardStore> {
    board: Arc<Board<S>>,
}

impl<S: BoardStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            board: self.board.clone(),
        }
    }
}

impl<S: BoardStore> AppState<S> {
    pub fn new(board: Board<S>) -> Self {
        Self {
            board: Arc::new(board),
        }
    }

    fn board(&self) -> &Board<S> {
        &self.board
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
    Internal(String),
}

impl From<BoardError> for ApiError {
    fn from(value: BoardError) -> Self {
        match value {
            BoardError::NotFound { .. } => ApiError::NotFound(value.to_string()),
            BoardError::Invalid(_) => ApiError::Invalid(value.to_string()),
            BoardError::EmptyTargetSet => ApiError::Conflict(value.to_string()),
            BoardError::Store(err) => {
                tracing::error!(error = %err, "store failure");
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ResourcePayload {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TimelineQuery {
    start: Option<NaiveDate>,
    skip_weekends: Option<bool>,
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct DropQuery {
    resource: Option<ResourceId>,
    moving: Option<WorkItemId>,
    x: f64,
}

pub fn router<S: BoardStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/resources", get(list_resources::<S>).post(create_resource::<S>))
        .route(
            "/resources/:id",
            get(get_resource::<S>)
                .put(rename_resource::<S>)
                .delete(delete_resource::<S>),
        )
        .route("/resources/:id/queue", get(resource_queue::<S>))
        .route("/pool", get(pool::<S>))
        .route("/work_items", get(list_work_items::<S>).post(create_work_item::<S>))
        .route(
            "/work_items/:id",
            get(get_work_item::<S>)
                .put(update_work_item::<S>)
                .delete(delete_work_item::<S>),
        )
        .route("/work_items/:id/pool", post(return_to_pool::<S>))
        .route("/moves", post(move_item::<S>))
        .route("/auto_assign", post(auto_assign::<S>))
        .route("/themes", get(themes::<S>))
        .route("/timeline", get(timeline::<S>))
        .route("/timeline/drop", get(resolve_drop::<S>))
        .route("/conflicts", get(conflicts::<S>))
        .route(
            "/snapshot",
            get(get_snapshot::<S>)
                .put(put_snapshot::<S>)
                .delete(clear_board::<S>),
        )
        .with_state(state)
}

pub async fn serve<S: BoardStore + 'static>(addr: SocketAddr, board: Board<S>) -> std::io::Result<()> {
    let app = router(AppState::new(board));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_resources<S: BoardStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    Ok(Json(state.board().resources()?))
}

async fn create_resource<S: BoardStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<ResourcePayload>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    let resource = state.board().create_resource(&payload.name)?;
    Ok((StatusCode::CREATED, Json(resource)))
}

async fn get_resource<S: BoardStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<ResourceId>,
) -> Result<Json<Resource>, ApiError> {
    Ok(Json(state.board().resource(id)?))
}

async fn rename_resource<S: BoardStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<ResourceId>,
    Json(payload): Json<ResourcePayload>,
) -> Result<Json<Resource>, ApiError> {
    Ok(Json(state.board().rename_resource(id, &payload.name)?))
}

async fn delete_resource<S: BoardStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<ResourceId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let migrated = state.board().delete_resource(id)?;
    Ok(Json(json!({ "returned_to_pool": migrated })))
}

async fn resource_queue<S: BoardStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<ResourceId>,
) -> Result<Json<Vec<QueuedItem>>, ApiError> {
    Ok(Json(state.board().queue(Some(id))?))
}

async fn pool<S: BoardStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<QueuedItem>>, ApiError> {
    Ok(Json(state.board().pool()?))
}

async fn list_work_items<S: BoardStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<WorkItem>>, ApiError> {
    Ok(Json(state.board().work_items()?))
}

async fn create_work_item<S: BoardStore>(
    State(state): State<AppState<S>>,
    Json(draft): Json<WorkItemDraft>,
) -> Result<(StatusCode, Json<WorkItem>), ApiError> {
    let item = state.board().create_work_item(draft)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_work_item<S: BoardStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<WorkItemId>,
) -> Result<Json<WorkItem>, ApiError> {
    Ok(Json(state.board().work_item(id)?))
}

async fn update_work_item<S: BoardStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<WorkItemId>,
    Json(draft): Json<WorkItemDraft>,
) -> Result<Json<WorkItem>, ApiError> {
    Ok(Json(state.board().update_work_item(id, draft)?))
}

async fn delete_work_item<S: BoardStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<WorkItemId>,
) -> Result<StatusCode, ApiError> {
    state.board().delete_work_item(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn return_to_pool<S: BoardStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<WorkItemId>,
) -> Result<Json<Assignment>, ApiError> {
    Ok(Json(state.board().remove_to_pool(id)?))
}

async fn move_item<S: BoardStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<Assignment>, ApiError> {
    Ok(Json(state.board().move_item(request)?))
}

async fn auto_assign<S: BoardStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<BalanceSummary>, ApiError> {
    Ok(Json(state.board().auto_assign_all()?))
}

async fn themes<S: BoardStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<ThemeSummary>>, ApiError> {
    Ok(Json(state.board().theme_summary()?))
}

async fn timeline<S: BoardStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<TimelineView>, ApiError> {
    let today = query
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let start = query.start.unwrap_or(today);
    Ok(Json(state.board().timeline(start, query.skip_weekends, today)?))
}

async fn resolve_drop<S: BoardStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<DropQuery>,
) -> Result<Json<DropTarget>, ApiError> {
    if !query.x.is_finite() {
        return Err(ApiError::Invalid("x must be a finite number".to_string()));
    }
    let target = state
        .board()
        .resolve_timeline_drop(query.resource, query.moving, query.x)?;
    Ok(Json(target))
}

async fn conflicts<S: BoardStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<DependencyConflict>>, ApiError> {
    Ok(Json(state.board().dependency_conflicts()?))
}

async fn get_snapshot<S: BoardStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<BoardSnapshot>, ApiError> {
    Ok(Json(state.board().snapshot()?))
}

async fn put_snapshot<S: BoardStore>(
    State(state): State<AppState<S>>,
    Json(snapshot): Json<BoardSnapshot>,
) -> Result<StatusCode, ApiError> {
    state.board().restore(&snapshot)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_board<S: BoardStore>(
    State(state): State<AppState<S>>,
) -> Result<StatusCode, ApiError> {
    state.board().clear()?;
    Ok(StatusCode::NO_CONTENT)
}
