//! Issues quote requests and applies their outcome to the store.

use crate::app_state::Action;
use crate::app_state_mut::QuoteStore;
use crate::error_flasher::ErrorFlasher;
use api::asset::Erc20Asset;
use api::quote_providers::{QuoteError, QuoteProvider};
use api::token_amount::TokenAmount;
use std::fmt;
use std::sync::Arc;

/// Everything needed to issue one quote request, tagged with the input generation it
/// was created for.
#[derive(Clone)]
pub struct QuoteRequestTicket {
    pub provider: Arc<dyn QuoteProvider>,
    pub asset: Erc20Asset,
    pub amount: TokenAmount,
    pub generation: u64,
}

impl fmt::Debug for QuoteRequestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuoteRequestTicket")
            .field("asset", &self.asset.asset_data)
            .field("amount", &self.amount)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Fetches a quote for `ticket` and records the result.
///
/// A ticket whose generation is no longer current is skipped before the provider is
/// called, and its result is discarded if the input changed while the request was in
/// flight. A quote priced for a different asset or amount counts as a failure.
/// Failures are shown through `error_flasher`. Never returns an error.
pub async fn fetch_quote(
    store: &QuoteStore,
    error_flasher: &ErrorFlasher,
    ticket: QuoteRequestTicket,
) {
    let QuoteRequestTicket {
        provider,
        asset,
        amount,
        generation,
    } = ticket;

    let base_unit_amount = match amount.to_base_units(asset.decimals()) {
        Ok(base_units) => base_units,
        Err(e) => {
            tracing::warn!(%amount, symbol = asset.symbol(), "cannot convert amount: {e}");
            store.dispatch(Action::QuoteRequestAbandoned { generation });
            return;
        }
    };

    if !store.is_current(generation) {
        tracing::debug!(generation, "input changed while debouncing, skipping quote request");
        store.dispatch(Action::QuoteRequestAbandoned { generation });
        return;
    }

    store.dispatch(Action::QuoteRequestPending { generation });
    tracing::info!(
        asset_data = %asset.asset_data,
        %base_unit_amount,
        generation,
        "requesting buy quote"
    );

    let result = provider
        .get_buy_quote(&asset.asset_data, &base_unit_amount)
        .await
        .and_then(|quote| {
            if quote.is_for(&asset.asset_data, &base_unit_amount) {
                Ok(quote)
            } else {
                Err(QuoteError::Unknown(format!(
                    "quote priced {} of {}, requested {base_unit_amount} of {}",
                    quote.asset_buy_amount, quote.asset_data, asset.asset_data
                )))
            }
        });

    if !store.is_current(generation) {
        tracing::debug!(generation, ok = result.is_ok(), "discarding stale quote response");
        store.dispatch(Action::QuoteRequestAbandoned { generation });
        return;
    }

    match result {
        Ok(quote) => {
            tracing::info!(
                generation,
                total_eth = %quote.best_case_quote_info.total_eth_amount,
                "buy quote received"
            );
            error_flasher.clear_error();
            store.dispatch(Action::QuoteRequestSucceeded { generation, quote });
        }
        Err(error) => {
            tracing::warn!(generation, %error, "quote request failed");
            store.dispatch(Action::QuoteRequestFailed { generation });
            error_flasher.flash_new_error(&error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::{AsyncProcessState, DisplayStatus};
    use api::asset::AssetData;
    use api::buy_quote::BuyQuote;
    use api::quote_providers::fixed_rate::FixedRate;
    use api::quote_providers::offline::Offline;
    use futures::future::BoxFuture;
    use num_bigint::BigUint;
    use std::time::Duration;

    /// Prices one base unit more than it was asked for.
    struct OffByOne;

    impl QuoteProvider for OffByOne {
        fn get_buy_quote<'a>(
            &'a self,
            asset_data: &'a AssetData,
            base_unit_amount: &'a BigUint,
        ) -> BoxFuture<'a, Result<BuyQuote, QuoteError>> {
            Box::pin(async move {
                FixedRate::new(BigUint::from(1u8))
                    .get_buy_quote(asset_data, &(base_unit_amount + 1u8))
                    .await
            })
        }
    }

    fn zrx() -> Erc20Asset {
        Erc20Asset::new(AssetData::new("0xzrx"), "ZRX", 18)
    }

    fn setup() -> (QuoteStore, ErrorFlasher) {
        let store = QuoteStore::new();
        let flasher = ErrorFlasher::new(store.clone(), Duration::from_secs(7));
        (store, flasher)
    }

    /// Performs the input change the ticket would have come from.
    fn ticket_for(
        store: &QuoteStore,
        provider: Arc<dyn QuoteProvider>,
        amount: TokenAmount,
    ) -> QuoteRequestTicket {
        let generation = store.change_input(Some(amount.clone()), Some(zrx().into()), true);
        QuoteRequestTicket {
            provider,
            asset: zrx(),
            amount,
            generation,
        }
    }

    #[tokio::test]
    async fn success_commits_quote_in_base_units() {
        let (store, flasher) = setup();
        let provider: Arc<dyn QuoteProvider> = Arc::new(FixedRate::new(BigUint::from(1u8)));
        let ticket = ticket_for(&store, provider, "1.5".parse().unwrap());

        fetch_quote(&store, &flasher, ticket).await;

        let state = store.snapshot();
        assert_eq!(state.quote_request_state(), AsyncProcessState::Success);
        let quote = state.latest_buy_quote().unwrap();
        assert_eq!(quote.asset_buy_amount, BigUint::from(1_500_000_000_000_000_000u64));
    }

    #[tokio::test]
    async fn success_clears_a_previous_error() {
        let (store, flasher) = setup();
        flasher.flash_new_error(&QuoteError::Network("x".into()));
        let provider: Arc<dyn QuoteProvider> = Arc::new(FixedRate::new(BigUint::from(1u8)));
        let ticket = ticket_for(&store, provider, TokenAmount::whole(1));

        fetch_quote(&store, &flasher, ticket).await;

        assert!(store.snapshot().latest_error().is_none());
    }

    #[tokio::test]
    async fn failure_sets_status_and_flashes() {
        let (store, flasher) = setup();
        let ticket = ticket_for(&store, Arc::new(Offline), TokenAmount::whole(1));

        fetch_quote(&store, &flasher, ticket).await;

        let state = store.snapshot();
        assert_eq!(state.quote_request_state(), AsyncProcessState::Failure);
        assert!(state.latest_buy_quote().is_none());
        let error = state.latest_error().unwrap();
        assert_eq!(error.message, "Could not reach the quote provider");
        assert_eq!(error.display, DisplayStatus::Present);
    }

    #[tokio::test]
    async fn quote_for_another_amount_is_treated_as_failure() {
        let (store, flasher) = setup();
        let ticket = ticket_for(&store, Arc::new(OffByOne), TokenAmount::whole(1));

        fetch_quote(&store, &flasher, ticket).await;

        let state = store.snapshot();
        assert_eq!(state.quote_request_state(), AsyncProcessState::Failure);
        assert!(state.latest_buy_quote().is_none());
        assert!(matches!(
            state.latest_error().map(|e| &e.cause),
            Some(QuoteError::Unknown(_))
        ));
    }

    #[tokio::test]
    async fn ticket_stale_at_issue_time_is_skipped() {
        let (store, flasher) = setup();
        let ticket = ticket_for(&store, Arc::new(Offline), TokenAmount::whole(1));
        store.dispatch(Action::InputChanged {
            amount: None,
            asset: Some(zrx().into()),
            request_quote: false,
        });

        fetch_quote(&store, &flasher, ticket).await;

        let state = store.snapshot();
        assert_eq!(state.quote_request_state(), AsyncProcessState::None);
        assert!(state.latest_error().is_none());
    }

    #[tokio::test]
    async fn excess_precision_is_abandoned() {
        let (store, flasher) = setup();
        let provider: Arc<dyn QuoteProvider> = Arc::new(FixedRate::new(BigUint::from(1u8)));
        store.dispatch(Action::InputChanged {
            amount: Some("0.001".parse().unwrap()),
            asset: Some(Erc20Asset::new(AssetData::new("0xusd"), "USD", 2).into()),
            request_quote: true,
        });
        let ticket = QuoteRequestTicket {
            provider,
            asset: Erc20Asset::new(AssetData::new("0xusd"), "USD", 2),
            amount: "0.001".parse().unwrap(),
            generation: store.generation(),
        };

        fetch_quote(&store, &flasher, ticket).await;

        let state = store.snapshot();
        assert_eq!(state.quote_request_state(), AsyncProcessState::None);
        assert!(state.latest_buy_quote().is_none());
    }
}
