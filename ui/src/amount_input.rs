//! The change handler behind the amount input of the ERC20 buy screen.

use crate::app_state_mut::QuoteStore;
use crate::debounce::{DebounceOptions, Debouncer};
use crate::error_flasher::ErrorFlasher;
use crate::quote_coordinator::{fetch_quote, QuoteRequestTicket};
use api::asset::{Asset, Erc20Asset};
use api::prefs::quote_prefs::QuotePrefs;
use api::token_amount::{ParseTokenAmountError, TokenAmount};

/// Keeps the store in step with the amount and asset the user has selected, and
/// requests a fresh quote whenever both are present.
pub struct SelectedErc20AssetAmountInput {
    store: QuoteStore,
    debounced_fetch: Debouncer<QuoteRequestTicket>,
}

impl SelectedErc20AssetAmountInput {
    /// Must be called from within a tokio runtime.
    pub fn new(store: QuoteStore, prefs: &QuotePrefs) -> Self {
        Self::with_debounce_options(store, prefs, DebounceOptions::default())
    }

    pub fn with_debounce_options(
        store: QuoteStore,
        prefs: &QuotePrefs,
        options: DebounceOptions,
    ) -> Self {
        let error_flasher = ErrorFlasher::new(store.clone(), prefs.error_flash);
        let fetch_store = store.clone();
        let debounced_fetch = Debouncer::new(prefs.quote_debounce, options, move |ticket| {
            let store = fetch_store.clone();
            let error_flasher = error_flasher.clone();
            async move { fetch_quote(&store, &error_flasher, ticket).await }
        });

        Self {
            store,
            debounced_fetch,
        }
    }

    /// The amount currently shown in the input.
    pub fn amount(&self) -> Option<TokenAmount> {
        self.store.with_state(|state| state.selected_asset_amount().cloned())
    }

    /// The selected asset, if it is an ERC20 token.
    pub fn asset(&self) -> Option<Erc20Asset> {
        self.store.with_state(|state| state.selected_erc20_asset())
    }

    /// Handles an edit of the amount or asset.
    ///
    /// Stores both values, drops the current quote and resets the order. If an amount,
    /// an ERC20 asset and a quote provider are all available, the status becomes
    /// `Pending` and a quote is requested once the input settles.
    pub fn on_change(&self, amount: Option<TokenAmount>, asset: Option<Asset>) {
        let provider = self.store.quote_provider();
        let erc20 = asset.as_ref().and_then(Asset::as_erc20);

        let request = match (&amount, erc20, provider) {
            (Some(amount), Some(asset), Some(provider)) => {
                Some((amount.clone(), asset, provider))
            }
            _ => None,
        };

        let generation = self
            .store
            .change_input(amount, asset, request.is_some());

        if let Some((amount, asset, provider)) = request {
            tracing::debug!(
                %amount,
                symbol = asset.symbol(),
                generation,
                "scheduling quote request"
            );
            self.debounced_fetch.call(QuoteRequestTicket {
                provider,
                asset,
                amount,
                generation,
            });
        }
    }

    /// Parses `text` as the new amount. An empty input clears the amount.
    ///
    /// Text that is not a valid amount leaves the state untouched.
    pub fn on_amount_text(&self, text: &str) -> Result<(), ParseTokenAmountError> {
        let text = text.trim();
        let amount = if text.is_empty() {
            None
        } else {
            Some(text.parse::<TokenAmount>()?)
        };
        let asset = self.store.with_state(|state| state.selected_asset().cloned());
        self.on_change(amount, asset);
        Ok(())
    }

    /// Switches the asset while keeping the amount the user typed.
    pub fn on_asset_selected(&self, asset: Option<Asset>) {
        self.on_change(self.amount(), asset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::{AsyncProcessState, OrderState};
    use api::asset::{AssetData, AssetMetaData, Erc721AssetMetaData};
    use api::buy_quote::BuyQuote;
    use api::quote_caching::CachingQuoteProvider;
    use api::quote_providers::fixed_rate::FixedRate;
    use api::quote_providers::{QuoteError, QuoteProvider, QuoteProviderKind};
    use futures::future::BoxFuture;
    use num_bigint::BigUint;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::sleep;

    /// Answers after a per-amount delay, failing for amounts listed in `failures`.
    #[derive(Default)]
    struct ScriptedProvider {
        calls: Arc<Mutex<Vec<BigUint>>>,
        delays: HashMap<BigUint, Duration>,
        failures: HashMap<BigUint, QuoteError>,
    }

    impl ScriptedProvider {
        fn delay(mut self, tokens: u64, delay: Duration) -> Self {
            self.delays.insert(base_units(tokens), delay);
            self
        }

        fn fail(mut self, tokens: u64, error: QuoteError) -> Self {
            self.failures.insert(base_units(tokens), error);
            self
        }
    }

    impl QuoteProvider for ScriptedProvider {
        fn get_buy_quote<'a>(
            &'a self,
            asset_data: &'a AssetData,
            base_unit_amount: &'a BigUint,
        ) -> BoxFuture<'a, Result<BuyQuote, QuoteError>> {
            self.calls.lock().unwrap().push(base_unit_amount.clone());
            Box::pin(async move {
                if let Some(delay) = self.delays.get(base_unit_amount) {
                    sleep(*delay).await;
                }
                if let Some(error) = self.failures.get(base_unit_amount) {
                    return Err(error.clone());
                }
                FixedRate::new(BigUint::from(1u8))
                    .get_buy_quote(asset_data, base_unit_amount)
                    .await
            })
        }
    }

    const QUIET: Duration = Duration::from_millis(200);

    fn base_units(tokens: u64) -> BigUint {
        BigUint::from(tokens) * BigUint::from(10u8).pow(18)
    }

    fn token_x() -> Asset {
        Erc20Asset::new(AssetData::new("0xf47261b0x"), "XYZ", 18).into()
    }

    fn prefs() -> QuotePrefs {
        QuotePrefs {
            quote_debounce: QUIET,
            error_flash: Duration::from_secs(7),
            quote_cache_ttl: None,
            provider: QuoteProviderKind::FixedRate,
        }
    }

    fn setup(
        provider: ScriptedProvider,
    ) -> (SelectedErc20AssetAmountInput, QuoteStore, Arc<Mutex<Vec<BigUint>>>) {
        let calls = provider.calls.clone();
        let store = QuoteStore::with_provider(Some(Arc::new(provider)));
        let input = SelectedErc20AssetAmountInput::new(store.clone(), &prefs());
        (input, store, calls)
    }

    fn calls_of(calls: &Arc<Mutex<Vec<BigUint>>>) -> Vec<BigUint> {
        calls.lock().unwrap().clone()
    }

    fn quoted_amount(store: &QuoteStore) -> Option<BigUint> {
        store.with_state(|s| s.latest_buy_quote().map(|q| q.asset_buy_amount.clone()))
    }

    #[tokio::test(start_paused = true)]
    async fn typed_amount_is_quoted_in_base_units_after_quiet_period() {
        let (input, store, calls) = setup(ScriptedProvider::default());

        input.on_change(Some(TokenAmount::whole(10)), Some(token_x()));
        assert!(store.snapshot().quote_request_state().is_pending());

        sleep(QUIET - Duration::from_millis(1)).await;
        assert!(calls_of(&calls).is_empty());

        sleep(Duration::from_millis(10)).await;
        assert_eq!(calls_of(&calls), vec![base_units(10)]);
        assert_eq!(store.snapshot().quote_request_state(), AsyncProcessState::Success);
        assert_eq!(quoted_amount(&store), Some(base_units(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_fetch_once_for_the_last_amount() {
        let (input, store, calls) = setup(ScriptedProvider::default());

        input.on_change(Some(TokenAmount::whole(1)), Some(token_x()));
        sleep(Duration::from_millis(50)).await;
        input.on_change(Some(TokenAmount::whole(10)), Some(token_x()));

        sleep(Duration::from_secs(1)).await;
        assert_eq!(calls_of(&calls), vec![base_units(10)]);
        assert_eq!(quoted_amount(&store), Some(base_units(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_response_for_old_amount_is_discarded() {
        let provider = ScriptedProvider::default()
            .delay(10, Duration::from_millis(1_000))
            .delay(20, Duration::from_millis(100));
        let (input, store, calls) = setup(provider);

        input.on_change(Some(TokenAmount::whole(10)), Some(token_x()));
        sleep(Duration::from_millis(500)).await;
        assert_eq!(calls_of(&calls), vec![base_units(10)]);

        input.on_change(Some(TokenAmount::whole(20)), Some(token_x()));

        // "20" resolves at ~800ms, "10" at ~1200ms.
        sleep(Duration::from_millis(400)).await;
        assert_eq!(quoted_amount(&store), Some(base_units(20)));
        assert!(store.snapshot().quote_request_state().is_success());

        sleep(Duration::from_millis(500)).await;
        assert_eq!(calls_of(&calls), vec![base_units(10), base_units(20)]);
        assert_eq!(quoted_amount(&store), Some(base_units(20)));
        assert!(store.snapshot().quote_request_state().is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn cached_provider_answers_new_amount_while_old_one_hangs() {
        let scripted = ScriptedProvider::default()
            .delay(10, Duration::from_secs(60))
            .delay(20, Duration::from_millis(100));
        let calls = scripted.calls.clone();
        let provider = CachingQuoteProvider::new(scripted, Duration::from_secs(30));
        let store = QuoteStore::with_provider(Some(Arc::new(provider)));
        let input = SelectedErc20AssetAmountInput::new(store.clone(), &prefs());

        input.on_change(Some(TokenAmount::whole(10)), Some(token_x()));
        sleep(Duration::from_millis(500)).await;
        input.on_change(Some(TokenAmount::whole(20)), Some(token_x()));

        sleep(Duration::from_millis(400)).await;
        assert_eq!(calls_of(&calls), vec![base_units(10), base_units(20)]);
        assert_eq!(quoted_amount(&store), Some(base_units(20)));
        assert!(store.snapshot().quote_request_state().is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn provider_failure_sets_failure_and_flashes_error() {
        let provider = ScriptedProvider::default().fail(5, QuoteError::InsufficientAssetLiquidity);
        let (input, store, _calls) = setup(provider);

        input.on_change(Some(TokenAmount::whole(5)), Some(token_x()));
        sleep(QUIET * 2).await;

        let state = store.snapshot();
        assert_eq!(state.quote_request_state(), AsyncProcessState::Failure);
        assert!(state.latest_buy_quote().is_none());
        assert!(state.buy_order_state().is_none());
        let error = state.latest_error().unwrap();
        assert_eq!(error.message, "Not enough XYZ available");
        assert!(error.display.is_present());
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_the_amount_keeps_status_and_resets_the_rest() {
        let (input, store, calls) = setup(ScriptedProvider::default());

        input.on_change(Some(TokenAmount::whole(10)), Some(token_x()));
        sleep(QUIET * 2).await;
        store.update_buy_order_state(OrderState::AwaitingSignature);

        input.on_change(None, Some(token_x()));

        let state = store.snapshot();
        assert!(state.quote_request_state().is_success());
        assert!(state.latest_buy_quote().is_none());
        assert!(state.buy_order_state().is_none());

        sleep(Duration::from_secs(1)).await;
        assert_eq!(calls_of(&calls).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_during_the_quiet_period_skips_the_fetch() {
        let (input, store, calls) = setup(ScriptedProvider::default());

        input.on_change(Some(TokenAmount::whole(10)), Some(token_x()));
        sleep(Duration::from_millis(50)).await;
        input.on_change(None, Some(token_x()));

        sleep(Duration::from_secs(1)).await;
        assert!(calls_of(&calls).is_empty());
        assert_eq!(store.snapshot().quote_request_state(), AsyncProcessState::None);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_requested_without_a_provider_or_erc20_asset() {
        let store = QuoteStore::new();
        let input = SelectedErc20AssetAmountInput::new(store.clone(), &prefs());

        input.on_change(Some(TokenAmount::whole(1)), Some(token_x()));
        assert!(store.snapshot().quote_request_state().is_none());

        let provider = ScriptedProvider::default();
        let calls = provider.calls.clone();
        store.set_quote_provider(Some(Arc::new(provider)));
        let kitty = Asset {
            asset_data: AssetData::new("0x02571792kitty"),
            meta_data: AssetMetaData::Erc721(Erc721AssetMetaData {
                name: "Kitty".to_string(),
                representation_url: None,
                primary_color: None,
            }),
        };
        input.on_asset_selected(Some(kitty));

        sleep(Duration::from_secs(1)).await;
        assert!(calls_of(&calls).is_empty());
        assert!(store.snapshot().quote_request_state().is_none());
        assert_eq!(input.amount(), Some(TokenAmount::whole(1)));
        assert!(input.asset().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn text_input_is_parsed_and_invalid_text_is_ignored() {
        let (input, store, calls) = setup(ScriptedProvider::default());
        input.on_asset_selected(Some(token_x()));

        input.on_amount_text("0.5").unwrap();
        assert_eq!(input.amount(), Some("0.5".parse().unwrap()));

        let generation = store.generation();
        assert!(input.on_amount_text("1.2.3").is_err());
        assert_eq!(store.generation(), generation);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(
            calls_of(&calls),
            vec![BigUint::from(500_000_000_000_000_000u64)]
        );

        input.on_amount_text("  ").unwrap();
        assert!(input.amount().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn leading_edge_requests_immediately() {
        let provider = ScriptedProvider::default();
        let calls = provider.calls.clone();
        let store = QuoteStore::with_provider(Some(Arc::new(provider)));
        let options = DebounceOptions {
            leading: true,
            trailing: true,
        };
        let input =
            SelectedErc20AssetAmountInput::with_debounce_options(store.clone(), &prefs(), options);

        input.on_change(Some(TokenAmount::whole(3)), Some(token_x()));
        sleep(Duration::from_millis(1)).await;

        assert_eq!(calls_of(&calls), vec![base_units(3)]);
        assert_eq!(quoted_amount(&store), Some(base_units(3)));
    }
}
