//! Debounced keyword input and out-of-order response protection for
//! paginated lists.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::protocol::Page;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::debug;

use crate::api::DEFAULT_PAGE_SIZE;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Holds back keyword changes until typing pauses for `delay`.
///
/// Every push cancels the pending update. The watch channel carries the
/// last settled value and is the only place it lives.
pub struct Debouncer {
    delay: Duration,
    settled: Arc<watch::Sender<String>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        let (settled, _) = watch::channel(String::new());
        Self {
            delay,
            settled: Arc::new(settled),
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.settled.subscribe()
    }

    pub fn current(&self) -> String {
        self.settled.borrow().clone()
    }

    pub async fn push(&self, input: impl Into<String>) {
        let input = input.into();
        let settled = Arc::clone(&self.settled);
        let delay = self.delay;

        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            settled.send_if_modified(|current| {
                if *current == input {
                    return false;
                }
                *current = input;
                true
            });
        }));
    }

    /// Settles `input` right away, dropping anything pending.
    pub async fn flush(&self, input: impl Into<String>) {
        if let Some(previous) = self.pending.lock().await.take() {
            previous.abort();
        }
        let input = input.into();
        self.settled.send_if_modified(|current| {
            if *current == input {
                return false;
            }
            *current = input;
            true
        });
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.get_mut().take() {
            pending.abort();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Numbers outgoing requests so only the newest response is applied.
#[derive(Debug, Default)]
pub struct RequestGeneration {
    latest: AtomicU64,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub keyword: String,
    pub page: u32,
    pub size: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    /// Keyword as sent to the backend; blank means no filter.
    pub fn keyword_filter(&self) -> Option<String> {
        let keyword = self.keyword.trim();
        (!keyword.is_empty()).then(|| keyword.to_string())
    }
}

/// One paginated list: its query and the newest page that came back.
#[derive(Debug)]
pub struct ListState<T> {
    query: ListQuery,
    generation: RequestGeneration,
    page: Option<Page<T>>,
}

impl<T> ListState<T> {
    pub fn new(size: u32) -> Self {
        Self {
            query: ListQuery {
                size,
                ..ListQuery::default()
            },
            generation: RequestGeneration::new(),
            page: None,
        }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// A new keyword always starts again from the first page.
    pub fn set_keyword(&mut self, keyword: impl Into<String>) -> bool {
        let keyword = keyword.into();
        if keyword == self.query.keyword {
            return false;
        }
        self.query.keyword = keyword;
        self.query.page = 0;
        true
    }

    pub fn set_page(&mut self, page: u32) {
        self.query.page = page;
    }

    pub fn begin_request(&self) -> Ticket {
        self.generation.begin()
    }

    /// True while no request newer than `ticket` has been started.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.is_current(ticket)
    }

    /// Stores `page` unless a newer request has been started since
    /// `ticket` was issued.
    pub fn accept(&mut self, ticket: Ticket, page: Page<T>) -> bool {
        if !self.generation.is_current(ticket) {
            debug!(?ticket, "dropping stale list response");
            return false;
        }
        self.page = Some(page);
        true
    }

    pub fn page(&self) -> Option<&Page<T>> {
        self.page.as_ref()
    }

    pub fn items(&self) -> &[T] {
        self.page.as_ref().map(|page| page.content.as_slice()).unwrap_or(&[])
    }

    pub fn total_pages(&self) -> u32 {
        self.page.as_ref().map(|page| page.total_pages).unwrap_or(0)
    }
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;
