//! Defines the shared, observable store that holds the quote-input state.

use crate::app_state::{Action, OrderState, QuoteState};
use api::asset::Asset;
use api::quote_providers::QuoteProvider;
use api::token_amount::TokenAmount;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// The single owner of [`QuoteState`], shared by every part of the quote flow.
///
/// Cloning is cheap and every clone observes the same state. All mutations go through
/// [`QuoteStore::dispatch`], which applies one reducer step atomically and wakes any
/// subscriber.
#[derive(Clone)]
pub struct QuoteStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: watch::Sender<QuoteState>,
    /// Absent until the host application configures one.
    provider: watch::Sender<Option<Arc<dyn QuoteProvider>>>,
    /// Source of `FlashedError` ids, shared by every flasher on this store.
    next_error_id: AtomicU64,
}

impl QuoteStore {
    pub fn new() -> Self {
        Self::with_provider(None)
    }

    pub fn with_provider(provider: Option<Arc<dyn QuoteProvider>>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: watch::Sender::new(QuoteState::default()),
                provider: watch::Sender::new(provider),
                next_error_id: AtomicU64::new(1),
            }),
        }
    }

    /// Applies `action` to the current state.
    pub fn dispatch(&self, action: Action) {
        self.apply(action);
    }

    /// Records an input change and returns the generation it started.
    ///
    /// The generation is read inside the same transition, so concurrent changes can
    /// never hand out each other's generation.
    pub fn change_input(
        &self,
        amount: Option<TokenAmount>,
        asset: Option<Asset>,
        request_quote: bool,
    ) -> u64 {
        let action = Action::InputChanged {
            amount,
            asset,
            request_quote,
        };
        self.apply(action)
    }

    /// Runs one reducer step and returns the generation of the resulting state.
    fn apply(&self, action: Action) -> u64 {
        tracing::trace!(?action, "dispatch");
        let mut generation = 0;
        self.inner.state.send_modify(|state| {
            let prev = std::mem::take(state);
            *state = prev.reduce(action);
            generation = state.generation();
        });
        generation
    }

    /// Hands out a fresh id for a flashed error.
    pub fn next_error_id(&self) -> u64 {
        self.inner.next_error_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Runs `f` against the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&QuoteState) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    pub fn snapshot(&self) -> QuoteState {
        self.inner.state.borrow().clone()
    }

    /// Returns a receiver that is notified after every dispatched action.
    pub fn subscribe(&self) -> watch::Receiver<QuoteState> {
        self.inner.state.subscribe()
    }

    pub fn generation(&self) -> u64 {
        self.with_state(QuoteState::generation)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.with_state(|state| state.is_current(generation))
    }

    pub fn quote_provider(&self) -> Option<Arc<dyn QuoteProvider>> {
        self.inner.provider.borrow().clone()
    }

    /// Replaces the provider used for requests issued from now on.
    ///
    /// Requests already in flight keep the provider they started with.
    pub fn set_quote_provider(&self, provider: Option<Arc<dyn QuoteProvider>>) {
        tracing::info!(configured = provider.is_some(), "quote provider changed");
        self.inner.provider.send_replace(provider);
    }

    /// Records progress of a purchase made from the current quote.
    pub fn update_buy_order_state(&self, order_state: OrderState) {
        self.dispatch(Action::UpdateBuyOrderState(order_state));
    }
}

impl Default for QuoteStore {
    fn default() -> Self {
        Self::new()
    }
}
