//! Page-number pagination shared by the meme feed and each comment list.

use crate::{errors::ApiError, models::Page};
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use tokio_util::sync::CancellationToken;

type PageFetcher<T> = Box<dyn Fn(u32) -> BoxFuture<'static, Result<Page<T>, ApiError>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum LoaderStatus {
    /// Nothing requested yet.
    Idle,
    /// First page in flight.
    Loading,
    Ready,
    FetchingNext,
    /// Last fetch failed; nothing is retried until the next call.
    Failed(ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded { cursor: u32 },
    /// Every page is already loaded; nothing was requested.
    Exhausted,
    /// The owner went away while the page was in flight; the result was dropped.
    Discarded,
}

/// Accumulates pages `1..=n` of one paginated resource, in order.
///
/// Fetches take `&mut self`, so one loader never has two pages in flight and
/// cursors only ever increase by one.
pub struct PaginatedLoader<T> {
    scope: String,
    fetch: PageFetcher<T>,
    pages: Vec<Page<T>>,
    status: LoaderStatus,
}

impl<T: Send + 'static> PaginatedLoader<T> {
    pub fn new<F, Fut>(scope: impl Into<String>, fetch: F) -> Self
    where
        F: Fn(u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>, ApiError>> + Send + 'static,
    {
        Self {
            scope: scope.into(),
            fetch: Box::new(move |cursor| fetch(cursor).boxed()),
            pages: Vec::new(),
            status: LoaderStatus::Idle,
        }
    }

    /// Fetches the next page, or the first one if nothing is loaded.
    pub async fn fetch_next_page(&mut self, cancel: &CancellationToken) -> Result<FetchOutcome, ApiError> {
        let Some(cursor) = self.next_cursor() else {
            tracing::trace!(scope = %self.scope, "No more pages");
            return Ok(FetchOutcome::Exhausted);
        };

        let next_status = if self.pages.is_empty() {
            LoaderStatus::Loading
        } else {
            LoaderStatus::FetchingNext
        };
        let previous = std::mem::replace(&mut self.status, next_status);
        tracing::debug!(scope = %self.scope, cursor, "Fetching page");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = (self.fetch)(cursor) => Some(result),
        };

        let result = match result {
            Some(result) if !cancel.is_cancelled() => result,
            _ => {
                tracing::debug!(scope = %self.scope, cursor, "Discarding page for a closed view");
                self.status = previous;
                return Ok(FetchOutcome::Discarded);
            }
        };

        match result {
            Ok(page) => {
                tracing::debug!(scope = %self.scope, cursor, total = page.total, results = page.results.len(), "Page loaded");
                self.pages.push(page);
                self.status = LoaderStatus::Ready;
                Ok(FetchOutcome::Loaded { cursor })
            }
            Err(e) => {
                tracing::warn!(scope = %self.scope, cursor, error = %e, "Page fetch failed");
                self.status = LoaderStatus::Failed(e.clone());
                Err(e)
            }
        }
    }
}

impl<T> PaginatedLoader<T> {
    pub fn status(&self) -> &LoaderStatus {
        &self.status
    }

    pub fn pages(&self) -> &[Page<T>] {
        &self.pages
    }

    pub fn loaded_pages(&self) -> usize {
        self.pages.len()
    }

    /// Server-reported total from the most recent page.
    pub fn total(&self) -> Option<u64> {
        self.pages.last().map(|p| p.total)
    }

    pub fn has_next_page(&self) -> bool {
        match self.pages.last() {
            Some(last) => (self.pages.len() as u64) < last.total_pages(),
            None => false,
        }
    }

    pub fn is_fetching_next_page(&self) -> bool {
        self.status == LoaderStatus::FetchingNext
    }

    /// Cursor the next fetch would request; `None` once exhausted.
    pub fn next_cursor(&self) -> Option<u32> {
        if self.pages.is_empty() {
            Some(1)
        } else if self.has_next_page() {
            Some(self.pages.len() as u32 + 1)
        } else {
            None
        }
    }

    /// All results so far, page 1 first, each page in server order.
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.pages.iter().flat_map(|page| page.results.iter())
    }

    /// Optimistically puts `item` at the head of page 1.
    ///
    /// `total` and `page_size` are left alone, so counts can lag the server
    /// until the list is reloaded. Returns `false` when no page is loaded yet.
    pub fn prepend(&mut self, item: T) -> bool {
        match self.pages.first_mut() {
            Some(first) => {
                first.results.insert(0, item);
                true
            }
            None => false,
        }
    }
}
