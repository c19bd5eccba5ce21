//! REST API module.
//!
//! Every content type exposes the same three endpoints: `load` (listing), `proc`
//! (create/update one record) and `action` (bulk actions). Responses share the
//! listing envelope below.

mod blogs;
mod categories;
mod error_logs;
mod tags;

pub use blogs::*;
pub use categories::*;
pub use error_logs::*;
pub use tags::*;

use std::future::Future;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::query::{ContentQuery, Listing};
use crate::AppState;

/// Response envelope shared by listing, save and action endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Total matching records; absent when record stats were skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<i64>,
    /// Single record for id lookups and saves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<T>,
    /// Records of a multi-record listing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<T>>,
}

impl<T> ListingResponse<T> {
    fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            records: None,
            record: None,
            posts: None,
        }
    }

    /// Envelope for a listing; id lookups fill `record`, everything else `posts`.
    pub fn from_listing(listing: Listing<T>, id_lookup: bool, skip_record_stats: bool) -> Self {
        let records = (!skip_record_stats).then_some(listing.total);
        if id_lookup {
            Self {
                records,
                record: listing.items.into_iter().next(),
                ..Self::success()
            }
        } else {
            Self {
                records,
                posts: Some(listing.items),
                ..Self::success()
            }
        }
    }

    pub fn with_record(record: T) -> Self {
        Self {
            record: Some(record),
            ..Self::success()
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

impl<T: Serialize> IntoResponse for ListingResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ListingResponse<T>, AppError>;

/// Run a listing through the shared executor and wrap it in the envelope.
async fn load_listing<Q, F, Fut>(state: &AppState, query: &Q, load: F) -> ApiResult<Q::Record>
where
    Q: ContentQuery,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<Q::Record>, AppError>>,
{
    let listing = state.listing.execute(query, load).await?;
    let base = query.base();
    Ok(ListingResponse::from_listing(
        listing,
        base.id > 0,
        base.skip_record_stats,
    ))
}

/// Rows a listing starts from: the single row for an id lookup, the whole table otherwise.
async fn fetch_rows<R, G, GFut, L, LFut>(id: i64, get: G, list: L) -> Result<Vec<R>, AppError>
where
    G: FnOnce(i64) -> GFut,
    GFut: Future<Output = Result<Option<R>, AppError>>,
    L: FnOnce() -> LFut,
    LFut: Future<Output = Result<Vec<R>, AppError>>,
{
    if id > 0 {
        Ok(get(id).await?.into_iter().collect())
    } else {
        list().await
    }
}

/// Drop cached listings of a content type after one of its records changed.
async fn invalidate(state: &AppState, namespace: &str) {
    state.listing.cache().invalidate_namespace(namespace).await;
}
