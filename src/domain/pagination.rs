//! Page/limit clamping and list metadata.

use serde::{Deserialize, Serialize};

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub limit: Option<u32>,
}

/// Resolved pagination window.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub offset: i64,
}

impl Pagination {
    /// Clamps the raw query against the configured default and maximum
    /// page sizes.
    #[must_use]
    pub fn resolve(query: PageQuery, default_limit: u32, max_limit: u32) -> Self {
        let page = query.page.filter(|page| *page > 0).unwrap_or(1);
        let limit = query
            .limit
            .filter(|limit| *limit > 0)
            .unwrap_or(default_limit)
            .min(max_limit);

        Self {
            page,
            limit,
            offset: i64::from(page - 1) * i64::from(limit),
        }
    }
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    #[serde(rename = "hasPrev")]
    pub has_prev: bool,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    #[serde(rename = "prevPage")]
    pub prev_page: Option<u32>,
    #[serde(rename = "nextPage")]
    pub next_page: Option<u32>,
}

impl PaginationMeta {
    /// Builds the metadata for a resolved window over `total` rows.
    #[must_use]
    pub fn new(total: i64, pagination: Pagination) -> Self {
        let Pagination { page, limit, .. } = pagination;
        let total_pages = (total.max(0) as u64)
            .div_ceil(u64::from(limit.max(1)))
            .max(1) as u32;

        Self {
            page,
            limit,
            total,
            total_pages,
            has_prev: page > 1,
            has_next: page < total_pages,
            prev_page: (page > 1).then(|| page - 1),
            next_page: (page < total_pages).then(|| page + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_limit_and_defaults_page() {
        let pagination = Pagination::resolve(
            PageQuery {
                page: None,
                limit: Some(100),
            },
            8,
            25,
        );
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 25);
        assert_eq!(pagination.offset, 0);

        let third = Pagination::resolve(
            PageQuery {
                page: Some(3),
                limit: None,
            },
            8,
            25,
        );
        assert_eq!(third.limit, 8);
        assert_eq!(third.offset, 16);
    }

    #[test]
    fn meta_reports_neighbour_pages() {
        let pagination = Pagination::resolve(
            PageQuery {
                page: Some(2),
                limit: Some(10),
            },
            10,
            25,
        );
        let meta = PaginationMeta::new(35, pagination);
        assert_eq!(meta.total_pages, 4);
        assert_eq!(meta.prev_page, Some(1));
        assert_eq!(meta.next_page, Some(3));

        let empty = PaginationMeta::new(0, pagination);
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next);
    }
}
