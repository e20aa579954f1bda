use serde::{Deserialize, Serialize};

use super::{Attachment, Seller};
use crate::utils::price::{cents_to_price, PriceLocale};

/// A classification label attached to products, identified by its slug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub slug: String,
}

/// A listing owned by a seller. Snapshots fetched from the API are never
/// mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "priceInCents")]
    pub price_in_cents: u64,
    pub status: String,
    pub owner: Seller,
    pub category: Category,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Product {
    /// Price with currency symbol, e.g. "R$ 1.500,50"
    pub fn price_display(&self, locale: &PriceLocale) -> String {
        format!(
            "{} {}",
            locale.currency_symbol,
            cents_to_price(self.price_in_cents, locale)
        )
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.attachments.first().map(|a| a.url.as_str())
    }
}
