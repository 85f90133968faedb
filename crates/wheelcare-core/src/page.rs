use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Page below 1 becomes 1; limit is held within `1..=max_limit`.
    #[must_use]
    pub fn new(page: u32, limit: u32, max_limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, max_limit.max(1)),
        }
    }

    const fn offset(self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.limit as usize)
    }
}

/// Page metadata returned with every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T: Clone> Page<T> {
    /// Slice one page out of `rows`, which are already filtered and ordered.
    #[must_use]
    pub fn of(rows: &[&T], request: PageRequest) -> Self {
        let total = rows.len();
        let limit = request.limit.max(1);
        let items = rows
            .iter()
            .skip(request.offset())
            .take(limit as usize)
            .map(|row| (*row).clone())
            .collect();
        Self {
            items,
            pagination: Pagination {
                page: request.page,
                limit,
                total,
                pages: total.div_ceil(limit as usize),
            },
        }
    }
}
