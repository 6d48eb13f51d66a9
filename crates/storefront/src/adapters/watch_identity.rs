// Rust guideline compliant 2026-10-16

//! `Identity` adapter over a `tokio::sync::watch` channel.
//!
//! The sending half plays the authentication service: `send_replace(Some(id))`
//! signs in, `send_replace(None)` signs out, dropping it closes the source.

use domain::{Identity, IdentityError, UserId};
use tokio::sync::watch;

/// Receiving side of the identity channel.
#[derive(Debug, Clone)]
pub struct WatchIdentity {
    rx: watch::Receiver<Option<UserId>>,
}

impl WatchIdentity {
    /// Create a channel seeded with `initial` and return both halves.
    #[must_use]
    pub fn channel(initial: Option<UserId>) -> (watch::Sender<Option<UserId>>, Self) {
        let (tx, rx) = watch::channel(initial);
        (tx, Self { rx })
    }
}

impl Identity for WatchIdentity {
    fn current_user(&self) -> Option<UserId> {
        self.rx.borrow().clone()
    }

    /// Intermediate values sent between two polls are coalesced; only the
    /// latest is returned.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Closed` once the sender has been dropped.
    async fn changed(&mut self) -> Result<Option<UserId>, IdentityError> {
        if let Err(e) = self.rx.changed().await {
            tracing::debug!("watch_identity.closed: {e}");
            return Err(IdentityError::Closed);
        }
        Ok(self.rx.borrow_and_update().clone())
    }
}
