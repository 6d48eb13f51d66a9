// Rust guideline compliant 2026-10-12

//! Reconciliation controller: decides which backend is authoritative.
//!
//! The controller is a two-state machine (`Guest`, `Authenticated(user)`)
//! driven only by identity values reported from outside. It never loads or
//! writes anything itself; [`ReconciliationController::select`] hands the
//! store the adapter for the current state, and the store performs the reload.

use domain::{
    CartAdapter, CartItem, CartMode, CartTable, KeyValueStore, PersistenceError, Product, UserId,
};

use crate::local::LocalAdapter;
use crate::remote::RemoteAdapter;

/// A mode change the store must follow with a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// `Guest -> Authenticated(user)`. The guest cart is not merged.
    Login(UserId),
    /// `Authenticated -> Guest`. The local cart is reloaded as last persisted.
    Logout,
    /// `Authenticated(from) -> Authenticated(to)` without an observed logout.
    ///
    /// Treated as a logout immediately followed by a login.
    Switch {
        /// Previously signed-in user.
        from: UserId,
        /// Newly signed-in user.
        to: UserId,
    },
}

/// The adapter selected for the current mode.
///
/// Implements `CartAdapter` by delegation so store code is written once.
#[derive(Debug)]
pub enum ActiveAdapter<'a, S: KeyValueStore, T: CartTable> {
    /// Device-local storage.
    Guest(&'a LocalAdapter<S>),
    /// Rows of one user in the server table.
    Authenticated(RemoteAdapter<'a, T>),
}

impl<S: KeyValueStore, T: CartTable> ActiveAdapter<'_, S, T> {
    /// Mode this adapter serves.
    #[must_use]
    pub fn mode(&self) -> CartMode {
        match self {
            Self::Guest(_) => CartMode::Guest,
            Self::Authenticated(remote) => CartMode::Authenticated(remote.user().clone()),
        }
    }
}

impl<S: KeyValueStore, T: CartTable> CartAdapter for ActiveAdapter<'_, S, T> {
    async fn load(&self) -> Result<Vec<CartItem>, PersistenceError> {
        match self {
            Self::Guest(local) => local.load().await,
            Self::Authenticated(remote) => remote.load().await,
        }
    }

    async fn upsert_item(&self, product: &Product, quantity: u32) -> Result<(), PersistenceError> {
        match self {
            Self::Guest(local) => local.upsert_item(product, quantity).await,
            Self::Authenticated(remote) => remote.upsert_item(product, quantity).await,
        }
    }

    async fn remove_item(&self, product_id: &str) -> Result<(), PersistenceError> {
        match self {
            Self::Guest(local) => local.remove_item(product_id).await,
            Self::Authenticated(remote) => remote.remove_item(product_id).await,
        }
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        match self {
            Self::Guest(local) => local.clear().await,
            Self::Authenticated(remote) => remote.clear().await,
        }
    }
}

/// Identity-driven state machine selecting the authoritative backend.
///
/// No terminal state: the machine alternates between `Guest` and
/// `Authenticated` for the lifetime of the session.
#[derive(Debug, Default)]
pub struct ReconciliationController {
    mode: CartMode,
}

impl ReconciliationController {
    /// Start in the mode matching the identity collaborator's current session.
    #[must_use]
    pub fn new(initial_user: Option<UserId>) -> Self {
        Self { mode: CartMode::from_user(initial_user) }
    }

    #[must_use]
    pub fn mode(&self) -> &CartMode {
        &self.mode
    }

    /// Feed the latest identity value; returns the transition taken, if any.
    ///
    /// Repeating the current identity is a no-op.
    pub fn observe(&mut self, user: Option<UserId>) -> Option<Transition> {
        let transition = match (&self.mode, &user) {
            (CartMode::Guest, None) => return None,
            (CartMode::Authenticated(current), Some(next)) if current == next => return None,
            (CartMode::Guest, Some(next)) => Transition::Login(next.clone()),
            (CartMode::Authenticated(_), None) => Transition::Logout,
            (CartMode::Authenticated(current), Some(next)) => {
                tracing::warn!(
                    from = %current,
                    to = %next,
                    "reconcile.switch: user changed without logout"
                );
                Transition::Switch { from: current.clone(), to: next.clone() }
            }
        };
        self.mode = CartMode::from_user(user);
        tracing::info!(?transition, "reconcile.transition");
        Some(transition)
    }

    /// Build the adapter for the current mode.
    #[must_use]
    pub fn select<'a, S: KeyValueStore, T: CartTable>(
        &self,
        local: &'a LocalAdapter<S>,
        table: &'a T,
    ) -> ActiveAdapter<'a, S, T> {
        match &self.mode {
            CartMode::Guest => ActiveAdapter::Guest(local),
            CartMode::Authenticated(user) => {
                ActiveAdapter::Authenticated(RemoteAdapter::new(table, user.clone()))
            }
        }
    }
}
