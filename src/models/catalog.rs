//! Product listing queries and response envelopes.

use serde::{Deserialize, Serialize};

use super::{Product, SortOrder};

/// Page size used by the product grid.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Server-side filter for product listings.
///
/// Unset fields are left out of the query string so the backend applies
/// its own defaults.
///
/// # Examples
///
/// ```
/// use storefront_rs::models::ProductFilter;
///
/// let filter = ProductFilter::new()
///     .search("lamp")
///     .category("Home")
///     .price_range(Some(10.0), Some(50.0))
///     .page(2);
/// assert_eq!(filter.page, 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilter {
    /// Free-text search.
    pub q: Option<String>,
    /// Category name.
    pub category: Option<String>,
    /// Lowest accepted price (inclusive).
    pub min_price: Option<f64>,
    /// Highest accepted price (inclusive).
    pub max_price: Option<f64>,
    /// Field to sort by.
    pub sort_by: String,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl Default for ProductFilter {
    #[inline]
    fn default() -> Self {
        Self {
            q: None,
            category: None,
            min_price: None,
            max_price: None,
            sort_by: "createdAt".to_owned(),
            sort_order: SortOrder::Desc,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProductFilter {
    /// Creates a filter matching every product, newest first.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to products matching a search term. Blank terms clear
    /// the search.
    #[inline]
    #[must_use]
    pub fn search<T: Into<String>>(mut self, term: T) -> Self {
        self.q = non_blank(term.into());
        self.page = 1;
        self
    }

    /// Restricts to one category. Blank names clear the category.
    #[inline]
    #[must_use]
    pub fn category<T: Into<String>>(mut self, name: T) -> Self {
        self.category = non_blank(name.into());
        self.page = 1;
        self
    }

    /// Sets the price bounds.
    ///
    /// Negative or non-finite bounds are dropped, and a bound that would
    /// cross the other one is ignored.
    #[inline]
    #[must_use]
    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        let valid = |bound: f64| bound.is_finite() && bound >= 0.0_f64;
        let min_bound = min.filter(|bound| valid(*bound));
        let max_bound = max.filter(|bound| valid(*bound));
        match (min_bound, max_bound) {
            (Some(low), Some(high)) if low > high => {
                self.min_price = Some(low);
            }
            (low, high) => {
                self.min_price = low;
                self.max_price = high;
            }
        }
        self.page = 1;
        self
    }

    /// Sets the sort field and direction.
    #[inline]
    #[must_use]
    pub fn sort<T: Into<String>>(mut self, field: T, order: SortOrder) -> Self {
        self.sort_by = field.into();
        self.sort_order = order;
        self
    }

    /// Selects a page (clamped to at least 1).
    #[inline]
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Sets the page size (clamped to at least 1).
    #[inline]
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Returns the non-empty query parameters in a stable order.
    #[inline]
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(8);
        if let Some(q) = self.q.as_ref() {
            pairs.push(("q", q.clone()));
        }
        if let Some(category) = self.category.as_ref() {
            pairs.push(("category", category.clone()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice", max.to_string()));
        }
        if !self.sort_by.is_empty() {
            pairs.push(("sortBy", self.sort_by.clone()));
            pairs.push(("sortOrder", self.sort_order.as_str().to_owned()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }
}

/// Trims a string, mapping blank input to `None`.
fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Pagination block of a listing response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Total matching products across all pages.
    #[serde(default)]
    pub total_docs: u64,
    /// Current page.
    #[serde(default)]
    pub page: Option<u32>,
    /// Number of pages.
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// One page of products.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Whether the backend accepted the request.
    #[serde(default)]
    pub success: bool,
    /// Products on this page.
    #[serde(default)]
    pub products: Vec<Product>,
    /// Pagination details, if the backend sent any.
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl ProductPage {
    /// Total matching products, falling back to this page's length.
    #[inline]
    #[must_use]
    pub fn total(&self) -> u64 {
        self.pagination
            .as_ref()
            .map_or(self.products.len() as u64, |page| page.total_docs)
    }

    /// Number of pages for the given page size, never less than one.
    #[inline]
    #[must_use]
    pub fn total_pages(&self, limit: u32) -> u64 {
        let size = u64::from(limit.max(1));
        self.total().div_ceil(size).max(1)
    }
}

/// Body carrying a single product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEnvelope {
    /// Whether the backend accepted the request.
    #[serde(default)]
    pub success: bool,
    /// The product, when present.
    #[serde(default)]
    pub product: Option<Product>,
    /// Optional backend message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Body carrying only a status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Whether the backend accepted the request.
    #[serde(default)]
    pub success: bool,
    /// Optional backend message.
    #[serde(default)]
    pub message: Option<String>,
}
