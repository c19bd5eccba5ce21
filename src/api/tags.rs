//! Tag API endpoints.

use axum::{extract::State, Json};

use super::{fetch_rows, invalidate, load_listing, ApiResult, ListingResponse};
use crate::db::ContentTable;
use crate::models::{ActionRequest, Tag, TagQuery};
use crate::query::ContentQuery;
use crate::AppState;

/// POST /api/tags/load - List tags matching the criteria.
pub async fn load_tags(State(state): State<AppState>, Json(query): Json<TagQuery>) -> ApiResult<Tag> {
    let repo = state.repo.clone();
    let id = query.base().id;
    load_listing(&state, &query, move || async move {
        fetch_rows(id, |id| repo.get_tag(id), || repo.list_tags()).await
    })
    .await
}

/// POST /api/tags/proc - Create or update a tag.
pub async fn proc_tag(State(state): State<AppState>, Json(tag): Json<Tag>) -> ApiResult<Tag> {
    let saved = state.repo.save_tag(&tag).await?;
    invalidate(&state, TagQuery::NAMESPACE).await;
    Ok(ListingResponse::with_record(saved))
}

/// POST /api/tags/action - Apply bulk actions to tags.
pub async fn tag_actions(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Tag> {
    let actions = request.resolve(Tag::ACTIONS)?;
    let affected = state.repo.apply_actions(ContentTable::Tags, &actions).await?;
    invalidate(&state, TagQuery::NAMESPACE).await;
    Ok(ListingResponse::with_message(format!(
        "{} record(s) updated",
        affected
    )))
}
