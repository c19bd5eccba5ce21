//! Blog API endpoints.

use axum::{extract::State, Json};

use super::{fetch_rows, invalidate, load_listing, ApiResult, ListingResponse};
use crate::db::ContentTable;
use crate::models::{ActionRequest, Blog, BlogQuery};
use crate::query::ContentQuery;
use crate::AppState;

/// POST /api/blogs/load - List blogs matching the criteria.
pub async fn load_blogs(
    State(state): State<AppState>,
    Json(query): Json<BlogQuery>,
) -> ApiResult<Blog> {
    let repo = state.repo.clone();
    let id = query.base().id;
    load_listing(&state, &query, move || async move {
        fetch_rows(id, |id| repo.get_blog(id), || repo.list_blogs()).await
    })
    .await
}

/// POST /api/blogs/proc - Create or update a blog.
pub async fn proc_blog(State(state): State<AppState>, Json(blog): Json<Blog>) -> ApiResult<Blog> {
    let saved = state.repo.save_blog(&blog).await?;
    invalidate(&state, BlogQuery::NAMESPACE).await;
    Ok(ListingResponse::with_record(saved))
}

/// POST /api/blogs/action - Apply bulk actions to blogs.
pub async fn blog_actions(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Blog> {
    let actions = request.resolve(Blog::ACTIONS)?;
    let affected = state
        .repo
        .apply_actions(ContentTable::Blogs, &actions)
        .await?;
    invalidate(&state, BlogQuery::NAMESPACE).await;
    Ok(ListingResponse::with_message(format!(
        "{} record(s) updated",
        affected
    )))
}
