//! Conversion between integer cents and user-facing price strings.
//!
//! Prices travel as integer cents. The user types and reads decimal strings
//! whose separators depend on the configured locale; pt-BR (comma decimal,
//! dot thousands) is the default.

use serde::{Deserialize, Serialize};

/// Maximum number of digits kept by the currency input mask.
/// 15 digits stays well inside the range where f64 parsing is exact.
const MAX_MASK_DIGITS: usize = 15;

/// Separators and symbol used to read and write prices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLocale {
    pub decimal_separator: char,
    pub thousands_separator: char,
    pub currency_symbol: String,
}

impl Default for PriceLocale {
    fn default() -> Self {
        Self::pt_br()
    }
}

impl PriceLocale {
    pub fn pt_br() -> Self {
        Self {
            decimal_separator: ',',
            thousands_separator: '.',
            currency_symbol: "R$".to_string(),
        }
    }

    pub fn en_us() -> Self {
        Self {
            decimal_separator: '.',
            thousands_separator: ',',
            currency_symbol: "$".to_string(),
        }
    }
}

/// Parse a user-entered price into integer cents.
///
/// Thousands separators are dropped, the decimal separator is normalized,
/// and a leading currency symbol is tolerated. Returns `None` for text that
/// is not a non-negative number.
pub fn price_to_cents(price: &str, locale: &PriceLocale) -> Option<u64> {
    let trimmed = price.trim();
    let trimmed = trimmed
        .strip_prefix(locale.currency_symbol.as_str())
        .unwrap_or(trimmed);

    let normalized: String = trimmed
        .chars()
        .filter(|c| *c != locale.thousands_separator && !c.is_whitespace())
        .map(|c| if c == locale.decimal_separator { '.' } else { c })
        .collect();

    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    Some((value * 100.0).round() as u64)
}

/// Format integer cents for display: thousands grouped, two fraction digits.
/// `150050` becomes `1.500,50` in pt-BR.
pub fn cents_to_price(cents: u64, locale: &PriceLocale) -> String {
    let units = cents / 100;
    let fraction = cents % 100;

    format!(
        "{}{}{:02}",
        group_thousands(units, locale.thousands_separator),
        locale.decimal_separator,
        fraction
    )
}

/// Input mask for price fields: every typed digit shifts in from the right
/// as cents. Text with no digits, or only zeros, masks to an empty string.
pub fn mask_currency(value: &str, locale: &PriceLocale) -> String {
    let digits: String = value
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_MASK_DIGITS)
        .collect();

    match digits.parse::<u64>() {
        Ok(0) | Err(_) => String::new(),
        Ok(cents) => cents_to_price(cents, locale),
    }
}

fn group_thousands(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }

    grouped
}
