//! Core library for Marketbook - a client for the marketplace REST API.
//!
//! This crate provides:
//! - `api`: HTTP client with bearer-token auth and 401 interception
//! - `auth`: Session lifecycle (sign-in, sign-out, restore) and persistence
//! - `filter`: Client-side product search and filtering
//! - `account`: Sign-up and profile update workflows, avatar uploads
//! - `catalog`: Product, category and view-metric loading
//! - `validation`: Form validation with per-field messages
//! - `utils`: Price and phone formatting helpers
//! - `config`: Application configuration

pub mod account;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod filter;
pub mod models;
pub mod utils;
pub mod validation;

pub use api::{user_message, ApiClient, ApiError};
pub use auth::{SessionManager, SessionState};
pub use config::Config;
pub use filter::{FilterCriteria, ProductFilter};
pub use models::{Attachment, Category, Product, Seller};
pub use utils::PriceLocale;
