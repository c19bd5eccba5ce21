//! Remote category API consumed by the tree session.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::api::ListingResponse;
use crate::errors::{AppError, ErrorResponse};
use crate::models::{ActionRequest, Category, CategoryQuery};

/// The category endpoints, as seen by a client.
///
/// Calls are opaque to the caller: no retries, no batching.
#[async_trait]
pub trait CategoryApi: Send + Sync {
    async fn load_records(
        &self,
        query: &CategoryQuery,
    ) -> Result<ListingResponse<Category>, AppError>;

    async fn process_record(&self, record: &Category)
        -> Result<ListingResponse<Category>, AppError>;

    async fn process_actions(
        &self,
        request: &ActionRequest,
    ) -> Result<ListingResponse<Category>, AppError>;
}

/// [`CategoryApi`] over HTTP against this backend's `/api/categories` routes.
#[derive(Clone)]
pub struct HttpCategoryApi {
    client: Client,
    base_url: String,
}

impl HttpCategoryApi {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ListingResponse<T>, AppError> {
        let url = format!("{}/api/categories/{}", self.base_url, endpoint);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.message,
                Err(_) => format!("{} returned {}", url, status),
            };
            return Err(match status {
                StatusCode::BAD_REQUEST => AppError::InvalidArgument(message),
                StatusCode::NOT_FOUND => AppError::NotFound(message),
                _ => AppError::Upstream(message),
            });
        }

        let envelope: ListingResponse<T> = response.json().await?;
        if !envelope.is_success() {
            return Err(AppError::Upstream(
                envelope
                    .message
                    .unwrap_or_else(|| format!("{} reported failure", url)),
            ));
        }
        Ok(envelope)
    }
}

#[async_trait]
impl CategoryApi for HttpCategoryApi {
    async fn load_records(
        &self,
        query: &CategoryQuery,
    ) -> Result<ListingResponse<Category>, AppError> {
        self.post("load", query).await
    }

    async fn process_record(
        &self,
        record: &Category,
    ) -> Result<ListingResponse<Category>, AppError> {
        self.post("proc", record).await
    }

    async fn process_actions(
        &self,
        request: &ActionRequest,
    ) -> Result<ListingResponse<Category>, AppError> {
        self.post("action", request).await
    }
}
