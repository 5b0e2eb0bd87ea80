//! Paged listing of the creature catalog.
//!
//! One shared state record drives every listing surface. Concurrent fetches
//! of the same page/limit pair collapse into one request, and a response
//! that arrives after a newer request has taken over is dropped instead of
//! clobbering the newer state.

use std::sync::Arc;

use tokio::sync::watch;

use crate::api::CatalogApi;
use crate::detail::PokemonRef;

/// Default number of entries per page.
pub const DEFAULT_PAGE_LIMIT: u32 = 3;

/// Shared listing state.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterState {
    pub entries: Vec<PokemonRef>,
    /// Current page, 1-based
    pub page: u32,
    pub limit: u32,
    /// Total number of catalog entries reported upstream
    pub total: u32,
    pub loading: bool,
    pub error: Option<String>,
    pub has_next: bool,
    pub has_prev: bool,
    request_key: Option<String>,
}

impl Default for RosterState {
    fn default() -> Self {
        RosterState {
            entries: Vec::new(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            total: 0,
            loading: false,
            error: None,
            has_next: false,
            has_prev: false,
            request_key: None,
        }
    }
}

impl RosterState {
    /// Number of pages at the current limit, at least 1.
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 1;
        }
        self.total.div_ceil(self.limit).max(1)
    }
}

/// Paged catalog listing over a [`CatalogApi`].
pub struct Roster {
    api: Arc<dyn CatalogApi>,
    state: watch::Sender<RosterState>,
}

impl Roster {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Roster {
            api,
            state: watch::channel(RosterState::default()).0,
        }
    }

    pub fn snapshot(&self) -> RosterState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RosterState> {
        self.state.subscribe()
    }

    /// Moves to a page without fetching. Floors at 1.
    pub fn set_page(&self, page: u32) {
        self.state.send_modify(|state| state.page = page.max(1));
    }

    /// Changes the page size without fetching. Floors at 1 and returns to
    /// the first page.
    pub fn set_limit(&self, limit: u32) {
        self.state.send_modify(|state| {
            state.limit = limit.max(1);
            state.page = 1;
        });
    }

    /// Moves to a page clamped to `[1, total_pages]` without fetching.
    pub fn go_to_page(&self, page: u32) {
        let snapshot = self.snapshot();
        let safe = page.clamp(1, snapshot.total_pages());
        if safe != snapshot.page {
            self.set_page(safe);
        }
    }

    /// Fetches the current page at the current limit.
    pub async fn refresh(&self) -> Option<Vec<PokemonRef>> {
        let snapshot = self.snapshot();
        self.fetch_page(snapshot.page, snapshot.limit).await
    }

    /// Fetches the following page when the catalog reports one.
    pub async fn next_page(&self) -> Option<Vec<PokemonRef>> {
        let snapshot = self.snapshot();
        if !snapshot.has_next {
            return None;
        }
        let target = (snapshot.page + 1).min(snapshot.total_pages());
        self.fetch_page(target, snapshot.limit).await
    }

    /// Fetches the preceding page when the catalog reports one.
    pub async fn prev_page(&self) -> Option<Vec<PokemonRef>> {
        let snapshot = self.snapshot();
        if !snapshot.has_prev {
            return None;
        }
        let target = snapshot.page.saturating_sub(1).max(1);
        self.fetch_page(target, snapshot.limit).await
    }

    /// Fetches one page and publishes it to the shared state.
    ///
    /// Returns `None` when an identical request is already in flight, when
    /// the response loses to a newer request, or on failure (the failure is
    /// recorded in the state).
    pub async fn fetch_page(&self, page: u32, limit: u32) -> Option<Vec<PokemonRef>> {
        let page = page.max(1);
        let limit = limit.max(1);
        let fetch_key = format!("{page}-{limit}");

        let started = self.state.send_if_modified(|state| {
            if state.loading && state.request_key.as_deref() == Some(fetch_key.as_str()) {
                return false;
            }
            state.loading = true;
            state.error = None;
            state.request_key = Some(fetch_key.clone());
            true
        });
        if !started {
            tracing::debug!("Page fetch already in flight for key: {}", fetch_key);
            return None;
        }

        let offset = (page - 1) * limit;
        match self.api.page(offset, limit).await {
            Ok(payload) => {
                let entries: Vec<PokemonRef> = payload
                    .results
                    .iter()
                    .filter_map(PokemonRef::from_summary)
                    .collect();

                let mut stored = None;
                self.state.send_if_modified(|state| {
                    // A newer request owns the state now; drop this response.
                    if state.request_key.as_deref() != Some(fetch_key.as_str()) {
                        return false;
                    }
                    state.entries = entries;
                    state.page = page;
                    state.limit = limit;
                    state.total = payload.count;
                    state.loading = false;
                    state.has_next = payload.next.is_some();
                    state.has_prev = payload.previous.is_some();
                    state.error = None;
                    stored = Some(state.entries.clone());
                    true
                });
                stored
            }
            Err(err) => {
                tracing::error!("Failed to fetch Pokemon page {}: {}", fetch_key, err);
                self.state.send_if_modified(|state| {
                    if state.request_key.as_deref() != Some(fetch_key.as_str()) {
                        return false;
                    }
                    state.loading = false;
                    state.error = Some(err.to_string());
                    true
                });
                None
            }
        }
    }
}
