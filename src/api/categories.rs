//! Category API endpoints.
//!
//! The category tree client drives these: it loads one parent's children at a time
//! and saves or deletes single records.

use axum::{extract::State, Json};

use super::{fetch_rows, invalidate, load_listing, ApiResult, ListingResponse};
use crate::db::ContentTable;
use crate::models::{ActionRequest, Category, CategoryQuery};
use crate::query::ContentQuery;
use crate::AppState;

/// POST /api/categories/load - List categories matching the criteria.
pub async fn load_categories(
    State(state): State<AppState>,
    Json(query): Json<CategoryQuery>,
) -> ApiResult<Category> {
    let repo = state.repo.clone();
    let id = query.base().id;
    load_listing(&state, &query, move || async move {
        fetch_rows(id, |id| repo.get_category(id), || repo.list_categories()).await
    })
    .await
}

/// POST /api/categories/proc - Create or update a category.
pub async fn proc_category(
    State(state): State<AppState>,
    Json(category): Json<Category>,
) -> ApiResult<Category> {
    let saved = state.repo.save_category(&category).await?;
    invalidate(&state, CategoryQuery::NAMESPACE).await;
    Ok(ListingResponse::with_record(saved))
}

/// POST /api/categories/action - Apply bulk actions to categories.
///
/// Deleting a category deletes its whole subtree.
pub async fn category_actions(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Category> {
    let actions = request.resolve(Category::ACTIONS)?;
    let affected = state
        .repo
        .apply_actions(ContentTable::Categories, &actions)
        .await?;
    invalidate(&state, CategoryQuery::NAMESPACE).await;
    Ok(ListingResponse::with_message(format!(
        "{} record(s) updated",
        affected
    )))
}
