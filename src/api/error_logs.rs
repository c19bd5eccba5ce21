//! Error log API endpoints.

use axum::{extract::State, Json};

use super::{fetch_rows, invalidate, load_listing, ApiResult, ListingResponse};
use crate::db::ContentTable;
use crate::models::{ActionRequest, ErrorLog, ErrorLogQuery};
use crate::query::ContentQuery;
use crate::AppState;

/// POST /api/errorlogs/load - List error logs matching the criteria.
pub async fn load_error_logs(
    State(state): State<AppState>,
    Json(query): Json<ErrorLogQuery>,
) -> ApiResult<ErrorLog> {
    let repo = state.repo.clone();
    let id = query.base().id;
    load_listing(&state, &query, move || async move {
        fetch_rows(id, |id| repo.get_error_log(id), || repo.list_error_logs()).await
    })
    .await
}

/// POST /api/errorlogs/proc - Record an error log entry.
pub async fn proc_error_log(
    State(state): State<AppState>,
    Json(log): Json<ErrorLog>,
) -> ApiResult<ErrorLog> {
    let saved = state.repo.save_error_log(&log).await?;
    invalidate(&state, ErrorLogQuery::NAMESPACE).await;
    Ok(ListingResponse::with_record(saved))
}

/// POST /api/errorlogs/action - Delete error logs in bulk.
pub async fn error_log_actions(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> ApiResult<ErrorLog> {
    let actions = request.resolve(ErrorLog::ACTIONS)?;
    let affected = state
        .repo
        .apply_actions(ContentTable::ErrorLogs, &actions)
        .await?;
    invalidate(&state, ErrorLogQuery::NAMESPACE).await;
    Ok(ListingResponse::with_message(format!(
        "{} record(s) deleted",
        affected
    )))
}
