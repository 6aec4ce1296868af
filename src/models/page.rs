//! Pagination of list pages

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// `?page=` query parameter (1-based)
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// Resolved page window handed to repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Rows to skip. Saturates for absurd page numbers, which then fall
    /// past the last page and come back as not found.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// One page of a listing
#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub items: Vec<T>,
    /// Total number of rows across all pages
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub num_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Build a page; asking past the last page is a 404, except page 1 of an
    /// empty listing.
    pub fn build(items: Vec<T>, total: i64, request: PageRequest) -> AppResult<Self> {
        let num_pages = ((total + request.per_page - 1) / request.per_page).max(1);
        if request.page > num_pages {
            return Err(AppError::NotFound(format!("Invalid page ({})", request.page)));
        }
        Ok(Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            num_pages,
            has_next: request.page < num_pages,
            has_previous: request.page > 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Genre;

    #[test]
    fn page_request_clamps_and_offsets() {
        let req = PageRequest::new(Some(0), 10);
        assert_eq!(req.page, 1);
        assert_eq!(req.offset(), 0);
        assert_eq!(PageRequest::new(Some(3), 10).offset(), 20);
        assert_eq!(PageRequest::new(None, 10).limit(), 10);
    }

    #[test]
    fn huge_page_number_is_not_found() {
        let req = PageRequest::new(Some(i64::MAX), 10);
        assert_eq!(req.offset(), i64::MAX);
        assert!(matches!(
            Page::<Genre>::build(Vec::new(), 42, req),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn page_counts_and_navigation() {
        let page = Page::<Genre>::build(Vec::new(), 21, PageRequest::new(Some(2), 10)).unwrap();
        assert_eq!(page.num_pages, 3);
        assert!(page.has_next);
        assert!(page.has_previous);

        let last = Page::<Genre>::build(Vec::new(), 20, PageRequest::new(Some(2), 10)).unwrap();
        assert_eq!(last.num_pages, 2);
        assert!(!last.has_next);
    }

    #[test]
    fn empty_listing_has_one_page_and_rejects_beyond() {
        let empty = Page::<Genre>::build(Vec::new(), 0, PageRequest::new(None, 10)).unwrap();
        assert_eq!(empty.num_pages, 1);
        assert!(matches!(
            Page::<Genre>::build(Vec::new(), 0, PageRequest::new(Some(2), 10)),
            Err(AppError::NotFound(_))
        ));
    }
}
