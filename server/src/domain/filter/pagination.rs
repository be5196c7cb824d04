//! Pagination metadata

use serde::{Serialize, Serializer};

/// Page metadata recomputed from the total row count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn calculate(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: u64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }

    pub fn next_page(&self) -> Option<u32> {
        self.has_next.then(|| self.page.saturating_add(1))
    }

    pub fn prev_page(&self) -> Option<u32> {
        self.has_prev.then(|| self.page - 1)
    }

    pub fn first_page(&self) -> u32 {
        1
    }

    pub fn last_page(&self) -> u64 {
        self.total_pages
    }
}

/// Page metadata plus the navigation links a client pages with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationView {
    #[serde(flatten)]
    pub meta: PaginationMeta,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
    pub first_page: u32,
    pub last_page: u64,
}

impl From<PaginationMeta> for PaginationView {
    fn from(meta: PaginationMeta) -> Self {
        Self {
            meta,
            next_page: meta.next_page(),
            prev_page: meta.prev_page(),
            first_page: meta.first_page(),
            last_page: meta.last_page(),
        }
    }
}

fn serialize_with_navigation<S: Serializer>(
    meta: &PaginationMeta,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    PaginationView::from(*meta).serialize(serializer)
}

/// Paged listing envelope
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[serde(serialize_with = "serialize_with_navigation")]
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: u32, limit: u32, total: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::calculate(page, limit, total),
        }
    }
}
