//! The client-side quote-input logic of the instant-buy flow.
//!
//! A host wires a [`QuoteStore`] and a [`SelectedErc20AssetAmountInput`] to its input
//! widgets, then renders from [`QuoteStore::subscribe`].

pub mod amount_input;
pub mod app_state;
pub mod app_state_mut;
pub mod debounce;
pub mod error_flasher;
pub mod quote_coordinator;

pub use amount_input::SelectedErc20AssetAmountInput;
pub use app_state::{
    Action, AsyncProcessState, DisplayStatus, FlashedError, OrderState, QuoteState,
};
pub use app_state_mut::QuoteStore;
