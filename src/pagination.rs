//! This modules defines the common functionality for paging list results.

use axum::http::Uri;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of records per page when not specified in a request.
    pub default_page_size: u64,
    /// The most records a client may ask for in one page.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// A validated request for one page of results.
///
/// Built with [PageRequest::new], so the offset of the page always fits in an SQLite integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    /// Parse the raw `page` and `page_size` query parameters.
    ///
    /// A missing or invalid `page_size` falls back to the default and sizes
    /// above the maximum are clamped.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidPage] if `page` is not a positive integer or is
    /// too large to select.
    pub fn new(
        page: Option<&str>,
        page_size: Option<&str>,
        config: &PaginationConfig,
    ) -> Result<Self, Error> {
        let page = match page {
            None => config.default_page,
            Some(raw_page) => match raw_page.parse::<u64>() {
                Ok(page) if page > 0 => page,
                _ => return Err(Error::InvalidPage),
            },
        };

        let page_size = page_size
            .and_then(|raw_size| raw_size.parse::<u64>().ok())
            .filter(|&size| size > 0)
            .unwrap_or(config.default_page_size)
            .min(config.max_page_size);

        // SQLite offsets are signed 64-bit integers.
        let offset_fits = (page - 1)
            .checked_mul(page_size)
            .is_some_and(|offset| offset <= i64::MAX as u64);
        if !offset_fits {
            return Err(Error::InvalidPage);
        }

        Ok(Self { page, page_size })
    }

    /// The number of rows to select.
    pub fn limit(&self) -> u64 {
        self.page_size
    }

    /// The number of rows to skip.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    /// Check that the page exists when there are `count` records in total.
    ///
    /// The first page always exists, even when there are no records.
    pub fn check(&self, count: u64) -> Result<(), Error> {
        if self.page > 1 && self.offset() >= count {
            return Err(Error::InvalidPage);
        }

        Ok(())
    }

    /// Wrap `results` with the total `count` and links to the neighbouring pages.
    ///
    /// The links keep the other query parameters of `uri`, such as filters.
    pub fn into_page<T>(self, results: Vec<T>, count: u64, uri: &Uri) -> Page<T> {
        let next = (self.page * self.page_size < count).then(|| page_link(uri, self.page + 1));
        let previous = (self.page > 1).then(|| page_link(uri, self.page - 1));

        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The total number of records across all pages.
    pub count: u64,
    /// The URL of the next page, if there is one.
    pub next: Option<String>,
    /// The URL of the previous page, if there is one.
    pub previous: Option<String>,
    /// The records on this page.
    pub results: Vec<T>,
}

fn page_link(uri: &Uri, page: u64) -> String {
    let mut params: Vec<(String, String)> = uri
        .query()
        .and_then(|query| serde_urlencoded::from_str(query).ok())
        .unwrap_or_default();

    params.retain(|(key, _)| key != "page");

    if page > 1 {
        params.push(("page".to_owned(), page.to_string()));
    }

    match serde_urlencoded::to_string(&params) {
        Ok(query) if !query.is_empty() => format!("{}?{query}", uri.path()),
        _ => uri.path().to_owned(),
    }
}
