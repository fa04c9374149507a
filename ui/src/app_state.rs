//! The quote-input state and the pure transitions that evolve it.
//!
//! `QuoteState` is plain data. It only changes through [`QuoteState::reduce`], which
//! takes the previous state and an [`Action`] and returns the next state, so every
//! transition can be tested without a runtime or a store.

use api::asset::{Asset, Erc20Asset};
use api::buy_quote::BuyQuote;
use api::quote_providers::QuoteError;
use api::token_amount::TokenAmount;

/// Lifecycle of the current quote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumIs, strum::IntoStaticStr)]
pub enum AsyncProcessState {
    #[default]
    None,
    Pending,
    Success,
    Failure,
}

/// Lifecycle of a purchase made from a quote.
#[derive(Debug, Clone, PartialEq, Eq, Default, strum::EnumIs)]
pub enum OrderState {
    #[default]
    None,
    AwaitingSignature,
    Processing { tx_hash: String },
    Success { tx_hash: String },
    Failure { tx_hash: String },
}

impl OrderState {
    /// The transaction hash, once the order has been submitted.
    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            Self::None | Self::AwaitingSignature => None,
            Self::Processing { tx_hash } | Self::Success { tx_hash } | Self::Failure { tx_hash } => {
                Some(tx_hash)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIs)]
pub enum DisplayStatus {
    Present,
    Hidden,
}

/// A user-facing error raised by a failed quote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashedError {
    /// Distinguishes successive flashes so an old expiry cannot hide a newer error.
    pub id: u64,
    pub message: String,
    pub cause: QuoteError,
    pub display: DisplayStatus,
}

/// Every way the quote-input state can change.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The user edited the amount or picked another asset.
    ///
    /// Stores both values, drops the current quote, resets the order and starts a new
    /// input generation. With `request_quote` set, the status turns `Pending` right
    /// away for the new generation.
    InputChanged {
        amount: Option<TokenAmount>,
        asset: Option<Asset>,
        request_quote: bool,
    },
    /// A quote request for `generation` is being issued.
    QuoteRequestPending { generation: u64 },
    QuoteRequestSucceeded { generation: u64, quote: BuyQuote },
    QuoteRequestFailed { generation: u64 },
    /// A request for `generation` was dropped without a result being applied.
    QuoteRequestAbandoned { generation: u64 },
    UpdateBuyOrderState(OrderState),
    SetError(FlashedError),
    HideError { id: u64 },
    ClearError,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuoteState {
    selected_asset_amount: Option<TokenAmount>,
    selected_asset: Option<Asset>,
    quote_request_state: AsyncProcessState,
    latest_buy_quote: Option<BuyQuote>,
    buy_order_state: OrderState,
    latest_error: Option<FlashedError>,
    /// Bumped on every input change.
    generation: u64,
    /// The generation whose request currently holds the `Pending` status.
    pending_generation: Option<u64>,
}

impl QuoteState {
    pub fn selected_asset_amount(&self) -> Option<&TokenAmount> {
        self.selected_asset_amount.as_ref()
    }

    pub fn selected_asset(&self) -> Option<&Asset> {
        self.selected_asset.as_ref()
    }

    /// The selected asset if it can be quoted. Any other asset class reads as `None`.
    pub fn selected_erc20_asset(&self) -> Option<Erc20Asset> {
        self.selected_asset.as_ref().and_then(Asset::as_erc20)
    }

    pub fn quote_request_state(&self) -> AsyncProcessState {
        self.quote_request_state
    }

    pub fn latest_buy_quote(&self) -> Option<&BuyQuote> {
        self.latest_buy_quote.as_ref()
    }

    pub fn buy_order_state(&self) -> &OrderState {
        &self.buy_order_state
    }

    pub fn latest_error(&self) -> Option<&FlashedError> {
        self.latest_error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` if no input change happened since `generation` was issued.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Applies `action` and returns the resulting state.
    pub fn reduce(mut self, action: Action) -> Self {
        match action {
            Action::InputChanged {
                amount,
                asset,
                request_quote,
            } => {
                self.selected_asset_amount = amount;
                self.selected_asset = asset;
                self.latest_buy_quote = None;
                self.buy_order_state = OrderState::None;
                self.generation += 1;
                if request_quote {
                    self.quote_request_state = AsyncProcessState::Pending;
                    self.pending_generation = Some(self.generation);
                }
            }
            Action::QuoteRequestPending { generation } => {
                if self.is_current(generation) {
                    self.quote_request_state = AsyncProcessState::Pending;
                    self.pending_generation = Some(generation);
                }
            }
            Action::QuoteRequestSucceeded { generation, quote } => {
                if self.is_current(generation) {
                    self.latest_buy_quote = Some(quote);
                    self.quote_request_state = AsyncProcessState::Success;
                    self.pending_generation = None;
                } else {
                    self.settle_stale(generation);
                }
            }
            Action::QuoteRequestFailed { generation } => {
                if self.is_current(generation) {
                    self.quote_request_state = AsyncProcessState::Failure;
                    self.pending_generation = None;
                } else {
                    self.settle_stale(generation);
                }
            }
            Action::QuoteRequestAbandoned { generation } => self.settle_stale(generation),
            Action::UpdateBuyOrderState(order_state) => self.buy_order_state = order_state,
            Action::SetError(error) => self.latest_error = Some(error),
            Action::HideError { id } => {
                if let Some(error) = self.latest_error.as_mut().filter(|error| error.id == id) {
                    error.display = DisplayStatus::Hidden;
                }
            }
            Action::ClearError => self.latest_error = None,
        }
        self
    }

    /// A request for `generation` ended without its result being applied.
    ///
    /// If that request was the one holding `Pending`, nothing is in flight any more
    /// and the status settles back to `None`. Otherwise a newer request owns the status
    /// and nothing changes.
    fn settle_stale(&mut self, generation: u64) {
        if self.quote_request_state.is_pending() && self.pending_generation == Some(generation) {
            self.quote_request_state = AsyncProcessState::None;
            self.pending_generation = None;
        }
    }
}
