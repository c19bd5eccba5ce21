//! CMS admin backend.
//!
//! A REST backend for blogs, categories, tags and error logs built around a generic
//! filtered-listing engine (`query`), plus the client-side category tree (`tree`)
//! that mirrors the category listing into a navigable hierarchy.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod query;
pub mod tree;

use std::sync::Arc;

use axum::{routing::get, routing::post, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;
use query::{CacheManager, ListingExecutor};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub listing: ListingExecutor,
}

impl AppState {
    pub fn new(repo: Repository, config: &Config) -> Self {
        let listing = ListingExecutor::new(CacheManager::from_config(&config));
        Self {
            repo: Arc::new(repo),
            listing,
        }
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Blogs
        .route("/blogs/load", post(api::load_blogs))
        .route("/blogs/proc", post(api::proc_blog))
        .route("/blogs/action", post(api::blog_actions))
        // Categories
        .route("/categories/load", post(api::load_categories))
        .route("/categories/proc", post(api::proc_category))
        .route("/categories/action", post(api::category_actions))
        // Tags
        .route("/tags/load", post(api::load_tags))
        .route("/tags/proc", post(api::proc_tag))
        .route("/tags/action", post(api::tag_actions))
        // Error logs
        .route("/errorlogs/load", post(api::load_error_logs))
        .route("/errorlogs/proc", post(api::proc_error_log))
        .route("/errorlogs/action", post(api::error_log_actions));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
