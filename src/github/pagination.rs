//! Exhaustive page-by-page retrieval of GitHub collections.
//!
//! GitHub list endpoints are paged with `page`/`per_page` query parameters.
//! [`fetch_all_pages`] walks a collection sequentially from page 1 until the
//! collection is exhausted or the configured page cap is reached. The cap is a
//! safety limit: callers must treat the result as possibly truncated for very
//! active resources.

use serde_json::Value;

use super::error::ForgeError;
use super::gateway::ForgeGateway;
use super::rate_limit::RateLimitInfo;

/// Largest page size GitHub accepts.
pub const MAX_PER_PAGE: u8 = 100;

/// Page size used unless configured otherwise.
pub const DEFAULT_PER_PAGE: u8 = MAX_PER_PAGE;

/// Page cap used unless configured otherwise.
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Page size and page-count cap for one collection walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    per_page: u8,
    max_pages: u32,
}

impl PaginationLimits {
    /// Creates validated limits.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::InvalidPagination`] when `per_page` is outside
    /// `1..=100` or `max_pages` is zero.
    pub fn new(per_page: u8, max_pages: u32) -> Result<Self, ForgeError> {
        if per_page == 0 {
            return Err(ForgeError::InvalidPagination {
                message: "per_page must be at least 1".to_owned(),
            });
        }

        if per_page > MAX_PER_PAGE {
            return Err(ForgeError::InvalidPagination {
                message: format!("per_page must not exceed {MAX_PER_PAGE}"),
            });
        }

        if max_pages == 0 {
            return Err(ForgeError::InvalidPagination {
                message: "max_pages must be at least 1".to_owned(),
            });
        }

        Ok(Self {
            per_page,
            max_pages,
        })
    }

    /// Items requested per page.
    #[must_use]
    pub const fn per_page(&self) -> u8 {
        self.per_page
    }

    /// Maximum number of pages fetched per collection.
    #[must_use]
    pub const fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Maximum number of records a single walk can return.
    #[must_use]
    pub const fn max_records(&self) -> u64 {
        self.per_page as u64 * self.max_pages as u64
    }
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// One page request against a collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// API path, e.g. `/repos/org/repo/commits`.
    pub path: String,
    /// Extra query parameters sent with every page.
    pub query: Vec<(String, String)>,
    /// Page number (1-based).
    pub page: u32,
    /// Items per page.
    pub per_page: u8,
}

/// Records returned by one page request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    /// Records in API order, undecoded.
    pub records: Vec<Value>,
    /// Quota snapshot from the response headers.
    pub rate_limit: Option<RateLimitInfo>,
}

/// Result of walking a whole collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagedRecords {
    /// All records collected, in page order.
    pub records: Vec<Value>,
    /// Number of page requests issued.
    pub pages_fetched: u32,
    /// True when the page cap stopped the walk while more records may exist.
    pub truncated: bool,
}

/// Fetches every page of `path` up to the configured cap.
///
/// Pages are requested one after another starting at page 1. The walk stops
/// at the first empty page, at the first short page (fewer than `per_page`
/// records), or after `max_pages` pages.
///
/// # Errors
///
/// Propagates the first [`ForgeError`] returned by the gateway. No retries
/// are attempted.
pub async fn fetch_all_pages<G>(
    gateway: &G,
    path: &str,
    query: &[(String, String)],
    limits: PaginationLimits,
) -> Result<PagedRecords, ForgeError>
where
    G: ForgeGateway + ?Sized,
{
    let mut collected = PagedRecords::default();
    let per_page = usize::from(limits.per_page());

    for page in 1..=limits.max_pages() {
        let request = PageRequest {
            path: path.to_owned(),
            query: query.to_vec(),
            page,
            per_page: limits.per_page(),
        };
        let raw_page = gateway.get_page(&request).await?;
        collected.pages_fetched = page;

        if let Some(rate_limit) = raw_page.rate_limit {
            tracing::debug!(
                path,
                page,
                remaining = rate_limit.remaining(),
                limit = rate_limit.limit(),
                "GitHub quota after page request"
            );
        }

        let received = raw_page.records.len();
        collected.records.extend(raw_page.records);

        if received < per_page {
            return Ok(collected);
        }
    }

    collected.truncated = true;
    tracing::warn!(
        path,
        max_pages = limits.max_pages(),
        records = collected.records.len(),
        "page cap reached; results may be truncated"
    );
    Ok(collected)
}
