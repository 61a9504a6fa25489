//! Screen lifetime and response ordering.
//!
//! Every remote call a screen makes runs inside its [`ScreenScope`]. Tearing
//! the scope down (the screen closing, or the session logging out) resolves
//! every in-flight call to `None`, so a late response can never touch state
//! that belongs to a closed screen.
//!
//! Loads additionally take a [`LoadTicket`]. A response is applied only if no
//! load issued after it has already been applied, which keeps a slow
//! "search: ab" response from overwriting a fast "search: abc" one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Issue order of a list load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Cancellation and ordering for one screen instance.
#[derive(Debug)]
pub struct ScreenScope {
    token: CancellationToken,
    issued: AtomicU64,
    applied: AtomicU64,
}

impl ScreenScope {
    /// Create a scope that ends when `token` is cancelled.
    ///
    /// Pass a child of the session token so logging out ends every screen.
    #[must_use]
    pub const fn new(token: CancellationToken) -> Self {
        Self {
            token,
            issued: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        }
    }

    /// Run a future unless the scope ends first.
    ///
    /// Returns `None` if the scope is, or becomes, torn down before the
    /// future completes.
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        if self.token.is_cancelled() {
            return None;
        }

        tokio::select! {
            biased;
            () = self.token.cancelled() => None,
            output = future => (!self.token.is_cancelled()).then_some(output),
        }
    }

    /// Take the next load ticket.
    pub fn ticket(&self) -> LoadTicket {
        LoadTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Record that a load is about to be applied.
    ///
    /// Returns `false` if a later ticket was already applied. Call this while
    /// holding the state lock the result is written under.
    pub fn accept(&self, ticket: LoadTicket) -> bool {
        let previous = self.applied.fetch_max(ticket.0, Ordering::SeqCst);
        ticket.0 > previous
    }

    /// Whether a load issued after `ticket` has already been applied.
    #[must_use]
    pub fn is_superseded(&self, ticket: LoadTicket) -> bool {
        self.applied.load(Ordering::SeqCst) > ticket.0
    }

    /// End the scope.
    pub fn teardown(&self) {
        self.token.cancel();
    }

    /// Whether the scope is still live.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}
