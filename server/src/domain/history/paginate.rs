//! Offset pagination over a history query

use super::error::ExportError;
use super::query::HistoryQuery;
use super::source::HistorySource;
use crate::core::constants::MAX_PER_PAGE;
use crate::data::types::HistoryRow;

/// Validated page request (1-based page, clamped page size)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    per_page: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Parse raw query values; missing or garbage input falls back to page 1
    /// and `default_per_page`
    pub fn from_raw(page: Option<&str>, per_page: Option<&str>, default_per_page: u32) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let per_page = parse_positive(per_page).unwrap_or(default_per_page);
        Self::new(page, per_page)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    let value = raw?.trim().parse::<i64>().ok()?;
    if value < 1 {
        return None;
    }
    Some(u32::try_from(value).unwrap_or(u32::MAX))
}

/// One page of transformed rows
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page))
    }
}

/// Count the query, then fetch and transform the requested slice
///
/// A page past the end returns an empty list with the true total and skips the fetch.
pub async fn paginate<T, F>(
    source: &dyn HistorySource,
    query: &HistoryQuery,
    pagination: Pagination,
    transform: F,
) -> Result<Page<T>, ExportError>
where
    F: Fn(HistoryRow) -> T,
{
    let total = source.count(query).await?;
    let offset = pagination.offset();

    let items = if offset >= total {
        Vec::new()
    } else {
        source
            .fetch_offset(query, offset, pagination.per_page())
            .await?
            .into_iter()
            .map(transform)
            .collect()
    };

    Ok(Page {
        items,
        total,
        page: pagination.page(),
        per_page: pagination.per_page(),
    })
}
