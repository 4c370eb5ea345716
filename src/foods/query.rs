use std::cmp::Ordering;

use serde::Deserialize;

use super::repo_types::{Food, FoodStatus};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    QuantityDesc,
    ExpireAsc,
    ExpireDesc,
}

impl SortOrder {
    /// Unknown or empty values fall back to quantity-descending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("expire_asc") => SortOrder::ExpireAsc,
            Some("expire_desc") => SortOrder::ExpireDesc,
            _ => SortOrder::QuantityDesc,
        }
    }

    /// SQL ORDER BY clause; the tail keeps pages stable across calls.
    pub fn order_by(&self) -> &'static str {
        match self {
            SortOrder::QuantityDesc => "food_quantity DESC, created_at ASC, id ASC",
            SortOrder::ExpireAsc => "expire_date ASC, created_at ASC, id ASC",
            SortOrder::ExpireDesc => "expire_date DESC, created_at ASC, id ASC",
        }
    }

    pub fn compare(&self, a: &Food, b: &Food) -> Ordering {
        let primary = match self {
            SortOrder::QuantityDesc => b.food_quantity.cmp(&a.food_quantity),
            SortOrder::ExpireAsc => a.expire_date.cmp(&b.expire_date),
            SortOrder::ExpireDesc => b.expire_date.cmp(&a.expire_date),
        };
        primary
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Raw query string. Numbers stay strings so junk falls back to defaults instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub status: Option<FoodStatus>,
    pub sort: SortOrder,
    pub page: i64,
    pub limit: i64,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            sort: SortOrder::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn positive_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(default)
}

impl ListingQuery {
    pub fn from_params(params: &ListingParams, status: Option<FoodStatus>) -> Self {
        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self {
            search,
            status,
            sort: SortOrder::parse(params.sort.as_deref()),
            page: positive_or(params.page.as_deref(), DEFAULT_PAGE),
            limit: positive_or(params.limit.as_deref(), DEFAULT_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Status and case-insensitive name filter; paging is not applied here.
    pub fn matches(&self, food: &Food) -> bool {
        if let Some(status) = self.status {
            if food.food_status != status {
                return false;
            }
        }
        match &self.search {
            Some(needle) => food
                .food_name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Escapes LIKE metacharacters and wraps the term for a substring match.
pub fn like_pattern(search: &str) -> String {
    let mut out = String::with_capacity(search.len() + 2);
    out.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// One page of matches plus the total match count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}
