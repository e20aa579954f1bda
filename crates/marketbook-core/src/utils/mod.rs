//! Utility functions for price, phone and string formatting.

pub mod format;
pub mod price;

// Re-export commonly used functions at module level
pub use format::{contains_ignore_case, digits_only, format_phone, truncate};
pub use price::{cents_to_price, mask_currency, price_to_cents, PriceLocale};
