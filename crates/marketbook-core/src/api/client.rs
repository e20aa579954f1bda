//! API client for communicating with the marketplace REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! API requests to fetch sellers, products, categories and metrics, and to
//! upload attachments.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::{header, multipart, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::{Attachment, Category, NewSeller, Product, Seller, SellerUpdate};

use super::ApiError;

/// Callback run when an authenticated request is rejected with 401
pub type UnauthorizedHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SellerResponse {
    seller: Seller,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    product: Product,
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct AttachmentsResponse {
    #[serde(default)]
    attachments: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
struct ViewsResponse {
    amount: u64,
}

/// A file to send to `POST /attachments`
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Builds an `ApiClient`. The unauthorized handler can only be registered here.
pub struct ApiClientBuilder {
    base_url: String,
    on_unauthorized: Option<UnauthorizedHandler>,
}

impl ApiClientBuilder {
    /// Register the callback invoked on 401 responses to authenticated requests
    pub fn on_unauthorized<F>(mut self, handler: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.on_unauthorized = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(self.build_with(client))
    }

    /// Build around an existing connection pool
    pub fn build_with(self, client: Client) -> ApiClient {
        ApiClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
            on_unauthorized: self.on_unauthorized,
        }
    }
}

/// API client for the marketplace.
/// Clone is cheap and clones share the bearer token slot and the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
    on_unauthorized: Option<UnauthorizedHandler>,
}

impl ApiClient {
    pub fn builder(base_url: &str) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.to_string(),
            on_unauthorized: None,
        }
    }

    /// Create a client without an unauthorized handler
    pub fn new(base_url: &str) -> Result<Self> {
        Self::builder(base_url).build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token sent with every request
    pub async fn set_token(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    /// Stop sending the bearer token
    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(token: &str) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(
            header::COOKIE,
            header::HeaderValue::from_str(&format!("accessToken={}", token))?,
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request with the current token attached.
    ///
    /// A 401 on a request that carried a token runs the unauthorized handler
    /// once before the error is returned, unless the token was replaced while
    /// the request was in flight.
    async fn send(&self, request: RequestBuilder, description: &str) -> Result<Response> {
        let token = self.token().await;
        let request = match token.as_deref() {
            Some(token) => request.headers(Self::auth_headers(token)?),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send request: {}", description))?;

        match Self::check_response(response).await {
            Ok(response) => Ok(response),
            Err(err) => {
                if err.is_unauthorized() && token.is_some() {
                    self.handle_unauthorized(token.as_deref()).await;
                }
                Err(anyhow::Error::new(err).context(format!("Request rejected: {}", description)))
            }
        }
    }

    async fn handle_unauthorized(&self, sent_token: Option<&str>) {
        if self.token().await.as_deref() != sent_token {
            debug!("Token changed during request, skipping unauthorized handler");
            return;
        }
        if let Some(ref handler) = self.on_unauthorized {
            warn!("Request rejected with 401, ending session");
            handler().await;
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .send(self.client.get(self.url(path)), &format!("GET {}", path))
            .await?;
        response
            .json()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .send(self.client.post(self.url(path)).json(body), &format!("POST {}", path))
            .await?;
        response
            .json()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .send(self.client.put(self.url(path)).json(body), &format!("PUT {}", path))
            .await?;
        response
            .json()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    // ===== Sessions =====

    /// Exchange credentials for an access token (`POST /sellers/sessions`)
    pub async fn create_session(&self, email: &str, password: &str) -> Result<Option<String>> {
        let response: SessionResponse = self
            .post("/sellers/sessions", &SessionRequest { email, password })
            .await?;
        Ok(response.access_token.filter(|t| !t.is_empty()))
    }

    /// Notify the API that the session ended (`POST /sign-out`).
    ///
    /// Sends `token` explicitly because the shared token slot has already been
    /// cleared by the time a sign-out reaches the server. Never runs the
    /// unauthorized handler.
    pub async fn end_session(&self, token: Option<&str>) -> Result<()> {
        let mut request = self.client.post(self.url("/sign-out"));
        if let Some(token) = token {
            request = request.headers(Self::auth_headers(token)?);
        }

        let response = request
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send sign-out request")?;
        Self::check_response(response).await?;
        Ok(())
    }

    // ===== Sellers =====

    /// Fetch the signed-in seller (`GET /sellers/me`)
    pub async fn fetch_current_seller(&self) -> Result<Seller> {
        let response: SellerResponse = self.get("/sellers/me").await?;
        Ok(response.seller)
    }

    /// Register a new seller (`POST /sellers`)
    pub async fn create_seller(&self, body: &NewSeller) -> Result<Seller> {
        let response: SellerResponse = self.post("/sellers", body).await?;
        Ok(response.seller)
    }

    /// Update the signed-in seller (`PUT /sellers`)
    pub async fn update_current_seller(&self, body: &SellerUpdate) -> Result<Seller> {
        let response: SellerResponse = self.put("/sellers", body).await?;
        Ok(response.seller)
    }

    // ===== Products =====

    pub async fn fetch_products(&self) -> Result<Vec<Product>> {
        let response: ProductsResponse = self.get("/products").await?;
        debug!(count = response.products.len(), "Fetched products");
        Ok(response.products)
    }

    pub async fn fetch_product(&self, id: &str) -> Result<Product> {
        let response: ProductResponse = self.get(&format!("/products/{}", id)).await?;
        Ok(response.product)
    }

    /// Number of views the product received in the last seven days
    pub async fn count_product_views(&self, id: &str) -> Result<u64> {
        let response: ViewsResponse = self
            .get(&format!("/products/{}/metrics/views", id))
            .await?;
        Ok(response.amount)
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let response: CategoriesResponse = self.get("/categories").await?;
        Ok(response.categories)
    }

    // ===== Attachments =====

    /// Upload files as multipart form data under the `files` field
    pub async fn upload_attachments(&self, files: Vec<UploadFile>) -> Result<Vec<Attachment>> {
        let mut form = multipart::Form::new();
        for file in files {
            let part = multipart::Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime_type)
                .context("Invalid attachment MIME type")?;
            form = form.part("files", part);
        }

        let response = self
            .send(
                self.client.post(self.url("/attachments")).multipart(form),
                "POST /attachments",
            )
            .await?;
        let parsed: AttachmentsResponse = response
            .json()
            .await
            .map_err(ApiError::from)
            .context("Failed to parse attachments response")?;
        Ok(parsed.attachments)
    }
}
