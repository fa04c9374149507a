use crate::app_state::{Action, DisplayStatus, FlashedError};
use crate::app_state_mut::QuoteStore;
use api::quote_providers::QuoteError;
use std::time::Duration;

/// Shows quote errors to the user for a limited time.
#[derive(Clone)]
pub struct ErrorFlasher {
    store: QuoteStore,
    flash_duration: Duration,
}

impl ErrorFlasher {
    pub fn new(store: QuoteStore, flash_duration: Duration) -> Self {
        Self {
            store,
            flash_duration,
        }
    }

    /// Records `error` as the pending error and hides it once the flash duration has
    /// passed.
    ///
    /// Replaces any previous error. The expiry of an earlier flash never touches the
    /// new one.
    pub fn flash_new_error(&self, error: &QuoteError) {
        let id = self.store.next_error_id();
        let symbol = self
            .store
            .with_state(|state| state.selected_erc20_asset().map(|a| a.symbol().to_string()));
        let message = describe(error, symbol.as_deref());
        tracing::info!(%message, "flashing quote error");

        self.store.dispatch(Action::SetError(FlashedError {
            id,
            message,
            cause: error.clone(),
            display: DisplayStatus::Present,
        }));

        let store = self.store.clone();
        let flash_duration = self.flash_duration;
        tokio::spawn(async move {
            tokio::time::sleep(flash_duration).await;
            store.dispatch(Action::HideError { id });
        });
    }

    /// Removes the pending error immediately.
    pub fn clear_error(&self) {
        if self.store.with_state(|state| state.latest_error().is_some()) {
            self.store.dispatch(Action::ClearError);
        }
    }
}

/// Turns a quote error into the message shown to the user.
pub fn describe(error: &QuoteError, symbol: Option<&str>) -> String {
    match error {
        QuoteError::InsufficientAssetLiquidity => match symbol {
            Some(symbol) => format!("Not enough {symbol} available"),
            None => "Not enough of this asset available".to_string(),
        },
        QuoteError::Network(_) => "Could not reach the quote provider".to_string(),
        QuoteError::Rejected(reason) => format!("Quote request rejected: {reason}"),
        QuoteError::Unknown(_) => "Something went wrong. Please try again.".to_string(),
    }
}
