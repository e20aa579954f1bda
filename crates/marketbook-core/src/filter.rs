//! Client-side product search and filtering.
//!
//! The full product list is fetched once; the visible subset is derived from
//! it with three predicates (text, price, category) joined by logical AND.
//! Input order is preserved.

use std::collections::BTreeSet;

use tracing::debug;

use crate::models::Product;
use crate::utils::contains_ignore_case;
use crate::utils::price::{price_to_cents, PriceLocale};

/// Filter dialog state. Replaced wholesale when filters are applied and
/// reset to empty when cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Lower price bound as typed by the user; empty means no bound
    pub min_price: String,
    /// Upper price bound as typed by the user; empty means no bound
    pub max_price: String,
    /// Category slugs; empty means every category
    pub categories: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.min_price.is_empty() && self.max_price.is_empty() && self.categories.is_empty()
    }

    /// Add the slug if absent, remove it if present
    pub fn toggle_category(&mut self, slug: &str) {
        if !self.categories.remove(slug) {
            self.categories.insert(slug.to_string());
        }
    }

    pub fn has_category(&self, slug: &str) -> bool {
        self.categories.contains(slug)
    }
}

/// Case-insensitive match against title or description
pub fn matches_search(product: &Product, search_text: &str) -> bool {
    search_text.is_empty()
        || contains_ignore_case(&product.title, search_text)
        || contains_ignore_case(&product.description, search_text)
}

/// Inclusive price range check. Empty or unparseable bounds impose no constraint.
pub fn matches_price(product: &Product, criteria: &FilterCriteria, locale: &PriceLocale) -> bool {
    let bound = |text: &str| {
        if text.is_empty() {
            None
        } else {
            price_to_cents(text, locale)
        }
    };

    let above_min = bound(&criteria.min_price)
        .map(|min| product.price_in_cents >= min)
        .unwrap_or(true);
    let below_max = bound(&criteria.max_price)
        .map(|max| product.price_in_cents <= max)
        .unwrap_or(true);

    above_min && below_max
}

pub fn matches_category(product: &Product, criteria: &FilterCriteria) -> bool {
    criteria.categories.is_empty() || criteria.categories.contains(&product.category.slug)
}

/// Derive the visible products. Stable: output keeps input order.
pub fn filter_products<'a>(
    products: &'a [Product],
    search_text: &str,
    criteria: &FilterCriteria,
    locale: &PriceLocale,
) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| {
            matches_search(p, search_text)
                && matches_price(p, criteria, locale)
                && matches_category(p, criteria)
        })
        .collect()
}

struct Memo {
    search_text: String,
    criteria: FilterCriteria,
    indices: Vec<usize>,
}

/// Owns the fetched product list and memoizes the last filter result.
///
/// The visible list is recomputed only when the products, the search text or
/// the criteria change; asking again with the same inputs reuses the result.
pub struct ProductFilter {
    products: Vec<Product>,
    locale: PriceLocale,
    memo: Option<Memo>,
    recomputations: usize,
}

impl ProductFilter {
    pub fn new(locale: PriceLocale) -> Self {
        Self {
            products: Vec::new(),
            locale,
            memo: None,
            recomputations: 0,
        }
    }

    /// Replace the product list (e.g. after a fetch)
    pub fn set_products(&mut self, products: Vec<Product>) {
        self.products = products;
        self.memo = None;
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn locale(&self) -> &PriceLocale {
        &self.locale
    }

    /// Visible products for the given inputs
    pub fn visible(&mut self, search_text: &str, criteria: &FilterCriteria) -> Vec<&Product> {
        self.refresh(search_text, criteria);
        match self.memo {
            Some(ref memo) => memo.indices.iter().map(|&i| &self.products[i]).collect(),
            None => Vec::new(),
        }
    }

    /// Positions in `products()` of the visible products, in order
    pub fn visible_indices(&mut self, search_text: &str, criteria: &FilterCriteria) -> &[usize] {
        self.refresh(search_text, criteria);
        match self.memo {
            Some(ref memo) => &memo.indices,
            None => &[],
        }
    }

    /// Number of times the visible list was recomputed
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }

    fn refresh(&mut self, search_text: &str, criteria: &FilterCriteria) {
        let fresh = self
            .memo
            .as_ref()
            .map(|m| m.search_text == search_text && &m.criteria == criteria)
            .unwrap_or(false);
        if fresh {
            return;
        }

        let indices: Vec<usize> = self
            .products
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                matches_search(p, search_text)
                    && matches_price(p, criteria, &self.locale)
                    && matches_category(p, criteria)
            })
            .map(|(i, _)| i)
            .collect();

        self.recomputations += 1;
        debug!(
            total = self.products.len(),
            visible = indices.len(),
            "Recomputed visible products"
        );

        self.memo = Some(Memo {
            search_text: search_text.to_string(),
            criteria: criteria.clone(),
            indices,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Seller};

    fn product(id: &str, title: &str, description: &str, price: u64, slug: &str) -> Product {
        Product {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            price_in_cents: price,
            status: "available".to_string(),
            owner: Seller {
                id: "s-1".to_string(),
                name: "Ana".to_string(),
                phone: "11987654321".to_string(),
                email: "ana@example.com".to_string(),
                avatar: None,
            },
            category: Category {
                id: format!("c-{}", slug),
                title: slug.to_string(),
                slug: slug.to_string(),
            },
            attachments: Vec::new(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("1", "Sofá retrátil", "Três lugares", 150050, "moveis"),
            product("2", "Bicicleta Caloi", "Aro 29, revisada", 89000, "esporte"),
            product("3", "Mesa de jantar", "Madeira maciça com seis cadeiras", 45000, "moveis"),
            product("4", "Camiseta", "Algodão, tamanho M", 2990, "vestuario"),
        ]
    }

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.clone()).collect()
    }

    fn criteria(min: &str, max: &str, categories: &[&str]) -> FilterCriteria {
        FilterCriteria {
            min_price: min.to_string(),
            max_price: max.to_string(),
            categories: categories.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_criteria_returns_input_in_order() {
        let products = catalog();
        let result = filter_products(&products, "", &FilterCriteria::default(), &PriceLocale::default());
        assert_eq!(ids(&result), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_search_matches_title_or_description_ignoring_case() {
        let products = catalog();
        let locale = PriceLocale::default();
        let empty = FilterCriteria::default();

        assert_eq!(ids(&filter_products(&products, "CALOI", &empty, &locale)), vec!["2"]);
        assert_eq!(ids(&filter_products(&products, "madeira", &empty, &locale)), vec!["3"]);
        assert_eq!(ids(&filter_products(&products, "a", &empty, &locale)), vec!["1", "2", "3", "4"]);
        assert!(filter_products(&products, "geladeira", &empty, &locale).is_empty());
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let products = catalog();
        let locale = PriceLocale::default();

        // min equal to a product's price includes it
        let result = filter_products(&products, "", &criteria("890,00", "", &[]), &locale);
        assert_eq!(ids(&result), vec!["1", "2"]);

        // max equal to a product's price includes it
        let result = filter_products(&products, "", &criteria("", "450,00", &[]), &locale);
        assert_eq!(ids(&result), vec!["3", "4"]);

        let result = filter_products(&products, "", &criteria("29,90", "1.500,50", &[]), &locale);
        assert_eq!(ids(&result), vec!["1", "2", "3", "4"]);

        let result = filter_products(&products, "", &criteria("29,91", "1.500,49", &[]), &locale);
        assert_eq!(ids(&result), vec!["2", "3"]);
    }

    #[test]
    fn test_category_filter() {
        let products = catalog();
        let locale = PriceLocale::default();

        let result = filter_products(&products, "", &criteria("", "", &["moveis"]), &locale);
        assert_eq!(ids(&result), vec!["1", "3"]);

        let result = filter_products(&products, "", &criteria("", "", &["vestuario", "esporte"]), &locale);
        assert_eq!(ids(&result), vec!["2", "4"]);

        let result = filter_products(&products, "", &criteria("", "", &["eletronicos"]), &locale);
        assert!(result.is_empty());
    }

    #[test]
    fn test_conjunction_law() {
        let products = catalog();
        let locale = PriceLocale::default();
        let searches = ["", "mesa", "a", "sofá"];
        let all_criteria = [
            FilterCriteria::default(),
            criteria("450,00", "", &[]),
            criteria("", "890,00", &["moveis"]),
            criteria("100,00", "2.000,00", &["moveis", "esporte"]),
        ];

        for search in searches {
            for c in &all_criteria {
                let result = filter_products(&products, search, c, &locale);
                for p in &products {
                    let expected = matches_search(p, search)
                        && matches_price(p, c, &locale)
                        && matches_category(p, c);
                    let present = result.iter().any(|r| r.id == p.id);
                    assert_eq!(present, expected, "product {} search {:?} criteria {:?}", p.id, search, c);
                }
            }
        }
    }

    #[test]
    fn test_unparseable_bound_is_ignored() {
        let products = catalog();
        let result = filter_products(&products, "", &criteria("abc", "", &[]), &PriceLocale::default());
        assert_eq!(result.len(), products.len());
    }

    #[test]
    fn test_toggle_category() {
        let mut c = FilterCriteria::default();
        assert!(c.is_empty());
        c.toggle_category("moveis");
        assert!(c.has_category("moveis"));
        assert!(!c.is_empty());
        c.toggle_category("moveis");
        assert!(!c.has_category("moveis"));
        assert!(c.is_empty());
    }

    #[test]
    fn test_product_filter_memoizes() {
        let mut filter = ProductFilter::new(PriceLocale::default());
        filter.set_products(catalog());
        let moveis = criteria("", "", &["moveis"]);

        assert_eq!(ids(&filter.visible("", &moveis)), vec!["1", "3"]);
        assert_eq!(ids(&filter.visible("", &moveis)), vec!["1", "3"]);
        assert_eq!(filter.recomputations, 1);

        assert_eq!(ids(&filter.visible("mesa", &moveis)), vec!["3"]);
        assert_eq!(filter.recomputations, 2);

        filter.set_products(catalog().into_iter().rev().collect());
        assert_eq!(ids(&filter.visible("mesa", &moveis)), vec!["3"]);
        assert_eq!(ids(&filter.visible("", &moveis)), vec!["3", "1"]);
        assert_eq!(filter.recomputations(), 4);
    }

    #[test]
    fn test_visible_indices_share_the_memo() {
        let mut filter = ProductFilter::new(PriceLocale::default());
        filter.set_products(catalog());
        let moveis = criteria("", "", &["moveis"]);

        assert_eq!(filter.visible_indices("", &moveis), &[0, 2]);
        assert_eq!(ids(&filter.visible("", &moveis)), vec!["1", "3"]);
        assert_eq!(filter.recomputations(), 1);
    }
}
