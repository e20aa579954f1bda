//! REST API client module for the marketplace backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! marketplace API: seller sessions and profiles, products, categories,
//! view metrics and attachment uploads.
//!
//! Authenticated requests carry the bearer token. A 401 on such a request is
//! routed to the single handler registered when the client is built.

pub mod client;
pub mod error;

pub use client::{ApiClient, ApiClientBuilder, UnauthorizedHandler, UploadFile};
pub use error::{user_message, ApiError};
