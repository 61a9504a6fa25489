//! Screen controllers.
//!
//! A screen owns its list state and a [`ScreenScope`]. Loads replace the list
//! wholesale with the backend's answer; mutations never patch it and are
//! followed by a fresh load instead.

pub mod catalog;

pub use catalog::{CatalogScreen, CatalogSnapshot, ProductCard};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::api::{ApiError, ApiRequest};
use crate::scope::ScreenScope;
use crate::session::SessionService;

/// What a screen action ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The remote call succeeded and its result was applied.
    Completed,
    /// A remote call failed; an error notice was shown.
    Failed,
    /// Input was invalid; a notice was shown and nothing was sent.
    Rejected,
    /// Nothing to do; no call was made and nothing was shown.
    Skipped,
    /// The response arrived after the screen closed, or after a newer load
    /// was applied, and was dropped.
    Discarded,
}

impl ActionOutcome {
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// What an empty list displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Loading,
    Empty,
}

/// Number of loads still waiting for their response.
#[derive(Debug, Default)]
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(&self) -> InFlightGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(Arc::clone(&self.0))
    }

    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Releases one in-flight load when dropped, including when the load's
/// future is dropped before it finishes.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Items of a list screen and its loading flags.
#[derive(Debug)]
pub struct ListState<T> {
    items: Vec<T>,
    in_flight: InFlight,
    refreshing: bool,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            in_flight: InFlight::default(),
            refreshing: false,
        }
    }
}

impl<T> ListState<T> {
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any load is still waiting for its response.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.count() > 0
    }

    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub const fn set_refreshing(&mut self, refreshing: bool) {
        self.refreshing = refreshing;
    }

    /// Placeholder for an empty list, `None` when there is something to show.
    #[must_use]
    pub fn placeholder(&self) -> Option<Placeholder> {
        if !self.items.is_empty() {
            None
        } else if self.is_loading() {
            Some(Placeholder::Loading)
        } else {
            Some(Placeholder::Empty)
        }
    }
}

/// Result of [`fetch_list`].
#[derive(Debug)]
pub enum Fetched {
    /// The list was replaced; carries the new length.
    Applied(usize),
    /// A newer load had already been applied.
    Stale,
    /// The scope ended before the response arrived.
    Discarded,
    Failed(ApiError),
}

impl Fetched {
    /// Map to an action outcome, leaving failure reporting to the caller.
    #[must_use]
    pub const fn outcome(&self) -> ActionOutcome {
        match self {
            Self::Applied(_) => ActionOutcome::Completed,
            Self::Stale | Self::Discarded => ActionOutcome::Discarded,
            Self::Failed(_) => ActionOutcome::Failed,
        }
    }
}

/// Fetch a collection and replace `list` with it.
///
/// An absent body counts as an empty collection. On failure the list keeps
/// its previous items. A failure of a load that a newer one has already
/// replaced is `Stale`, not `Failed`. The loading counter is released on
/// every path, and also when the returned future is dropped.
pub async fn fetch_list<T: DeserializeOwned>(
    scope: &ScreenScope,
    session: &SessionService,
    list: &RwLock<ListState<T>>,
    request: ApiRequest,
) -> Fetched {
    let ticket = scope.ticket();
    let loading = list.read().await.in_flight.enter();

    let result = scope
        .run(session.authenticated_request::<Vec<T>>(request))
        .await;

    let mut state = list.write().await;
    drop(loading);

    match result {
        None => Fetched::Discarded,
        Some(_) if !scope.is_active() => Fetched::Discarded,
        Some(Err(_)) if scope.is_superseded(ticket) => Fetched::Stale,
        Some(Err(e)) => Fetched::Failed(e),
        Some(Ok(items)) => {
            if !scope.accept(ticket) {
                return Fetched::Stale;
            }
            state.items = items.unwrap_or_default();
            Fetched::Applied(state.items.len())
        }
    }
}
