//! Typed building blocks for derived views: enumerated sort stages and the
//! pagination contract.
//!
//! Raw query-string input never reaches the store. Sort fields and
//! directions parse into closed enums (anything outside the set falls back
//! to the default) and page/limit values are clamped to positive integers,
//! with non-numeric input defaulting rather than failing.

use serde::Serialize;

/// Default page size.
pub const DEFAULT_LIMIT: i64 = 10;

/// Upper bound on page size to keep a single view bounded.
pub const MAX_LIMIT: i64 = 100;

/// Permitted sort fields for video listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl SortField {
    /// Parse from a query parameter; unknown or absent input defaults to
    /// creation time.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("views") => Self::Views,
            Some("duration") => Self::Duration,
            Some("title") => Self::Title,
            _ => Self::CreatedAt,
        }
    }

    /// The whitelisted column this field sorts by.
    pub fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "v.created_at",
            Self::Views => "v.views",
            Self::Duration => "v.duration_secs",
            Self::Title => "v.title",
        }
    }
}

/// Sort direction; defaults to descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Render the ORDER BY clause for a sort stage. Ties are always broken by
/// id descending so pagination over equal keys is stable.
pub fn order_by(field: SortField, direction: SortDirection) -> String {
    format!("ORDER BY {} {}, v.id DESC", field.column(), direction.keyword())
}

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build from raw query-string values. Non-numeric input defaults;
    /// values are clamped to positive integers and the limit is capped.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// One page of a derived view, with the totals the pagination contract
/// requires.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: i64,
    pub total_pages: i64,
    pub page: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Page<T> {
    /// Assemble a page from the slice of items and the overall item count.
    pub fn new(items: Vec<T>, total_items: i64, request: PageRequest) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + request.limit - 1) / request.limit
        };
        Self {
            items,
            total_items,
            total_pages,
            page: request.page,
            limit: request.limit,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1 && total_pages > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults() {
        let req = PageRequest::from_raw(None, None);
        assert_eq!(req, PageRequest { page: 1, limit: 10 });
    }

    #[test]
    fn non_numeric_input_defaults_rather_than_fails() {
        let req = PageRequest::from_raw(Some("abc"), Some("-"));
        assert_eq!(req, PageRequest { page: 1, limit: 10 });
    }

    #[test]
    fn values_are_clamped_to_positive() {
        let req = PageRequest::from_raw(Some("0"), Some("-5"));
        assert_eq!(req, PageRequest { page: 1, limit: 1 });
        let req = PageRequest::from_raw(Some("3"), Some("10000"));
        assert_eq!(req.limit, MAX_LIMIT);
    }

    #[test]
    fn twenty_five_items_at_limit_ten_make_three_pages() {
        let req = PageRequest { page: 1, limit: 10 };
        let page = Page::new(vec![(); 10], 25, req);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page);
        assert!(!page.has_prev_page);

        let req = PageRequest { page: 3, limit: 10 };
        let page = Page::new(vec![(); 5], 25, req);
        assert_eq!(page.items.len(), 5);
        assert!(!page.has_next_page);
        assert!(page.has_prev_page);
    }

    #[test]
    fn empty_result_has_no_pages() {
        let page = Page::<()>::new(vec![], 0, PageRequest::default());
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page);
        assert!(!page.has_prev_page);
    }

    #[test]
    fn sort_field_whitelist_rejects_unknown_input() {
        assert_eq!(SortField::parse(Some("views")), SortField::Views);
        assert_eq!(
            SortField::parse(Some("password_hash; DROP TABLE videos")),
            SortField::CreatedAt
        );
        assert_eq!(SortField::parse(None), SortField::CreatedAt);
    }

    #[test]
    fn sort_direction_defaults_to_desc() {
        assert_eq!(SortDirection::parse(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("sideways")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(None), SortDirection::Desc);
    }

    #[test]
    fn order_by_renders_whitelisted_column_with_id_tiebreak() {
        let clause = order_by(SortField::Views, SortDirection::Asc);
        assert_eq!(clause, "ORDER BY v.views ASC, v.id DESC");
    }
}
