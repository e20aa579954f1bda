//! Product catalog loading and seller contact links.

use anyhow::{Context, Result};
use reqwest::Url;
use tracing::debug;

use crate::api::ApiClient;
use crate::models::{Category, Product};
use crate::utils::digits_only;

pub const PRODUCTS_FALLBACK: &str = "Unable to load products!";
pub const CATEGORIES_FALLBACK: &str = "Unable to load the categories!";
pub const PRODUCT_DETAILS_FALLBACK: &str = "Unable to load product details!";
pub const PRODUCT_VIEWS_FALLBACK: &str = "Unable to load product views from the last 7 days!";

/// WhatsApp click-to-chat endpoint
const CONTACT_BASE_URL: &str = "https://wa.me";

/// Country code prefixed to seller phone numbers
const COUNTRY_CODE: &str = "55";

pub async fn load_products(api: &ApiClient) -> Result<Vec<Product>> {
    api.fetch_products().await.context("Failed to load products")
}

pub async fn load_categories(api: &ApiClient) -> Result<Vec<Category>> {
    api.fetch_categories()
        .await
        .context("Failed to load categories")
}

/// A product and its view count, loaded side by side.
/// Each half fails on its own so the screen can show whatever arrived.
pub struct ProductDetails {
    pub product: Result<Product>,
    pub views: Result<u64>,
}

pub async fn load_product_details(api: &ApiClient, id: &str) -> ProductDetails {
    let (product, views) = tokio::join!(api.fetch_product(id), api.count_product_views(id));
    debug!(
        product_id = %id,
        product_ok = product.is_ok(),
        views_ok = views.is_ok(),
        "Loaded product details"
    );

    ProductDetails {
        product: product.context("Failed to load product"),
        views: views.context("Failed to load product views"),
    }
}

/// Message sent to the owner when opening the chat
pub fn contact_message(product: &Product) -> String {
    format!(
        "Hi, {}! I'm interested in the product \"{}\"!",
        product.owner.name, product.title
    )
}

/// Chat link for the product owner's phone with a pre-filled message
pub fn contact_url(product: &Product) -> Result<Url> {
    let base = format!(
        "{}/{}{}",
        CONTACT_BASE_URL,
        COUNTRY_CODE,
        digits_only(&product.owner.phone)
    );
    Url::parse_with_params(&base, &[("text", contact_message(product))])
        .context("Failed to build contact link")
}
