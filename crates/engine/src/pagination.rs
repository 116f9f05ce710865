use serde::Serialize;

/// Pagination figures reported by the transport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub total_pages: Option<u32>,
}

/// Resolved pagination state for the loaded page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total: u64,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            total_pages: 1,
            total: 0,
        }
    }
}

impl PageInfo {
    /// "previous" is disabled on the first page.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// "next" is disabled on (or past) the last page.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Resolves pagination, preferring transport figures over local ones.
///
/// `total_pages` falls back to `max(1, ceil(total / page_size))`.
pub fn paginate(
    meta: Option<&PageMeta>,
    fallback_row_count: u64,
    current_page: u32,
    current_page_size: u32,
) -> PageInfo {
    let meta = meta.copied().unwrap_or_default();
    let total = meta.total.unwrap_or(fallback_row_count);
    let page = meta.page.unwrap_or(current_page);
    let page_size = meta.page_size.unwrap_or(current_page_size);
    let total_pages = meta
        .total_pages
        .unwrap_or_else(|| total_pages_for(total, page_size));

    PageInfo {
        page,
        page_size,
        total_pages,
        total,
    }
}

fn total_pages_for(total: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = total.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
