//! Provides the quote returned by a quote provider for buying an amount of an asset.

use crate::asset::AssetData;
use num_bigint::BigUint;
use serde::Deserialize;
use serde::Serialize;

/// Pricing details for one fill scenario of a buy quote. All amounts are in wei.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyQuoteInfo {
    /// Cost of the requested asset amount before fees, in wei.
    pub asset_eth_amount: BigUint,
    /// Fee charged on top of the asset amount, in wei.
    pub fee_eth_amount: BigUint,
    /// Everything the buyer pays: asset plus fee.
    pub total_eth_amount: BigUint,
}

impl BuyQuoteInfo {
    /// Builds the info from an asset cost and a fee, deriving the total.
    pub fn new(asset_eth_amount: BigUint, fee_eth_amount: BigUint) -> Self {
        let total_eth_amount = &asset_eth_amount + &fee_eth_amount;
        Self {
            asset_eth_amount,
            fee_eth_amount,
            total_eth_amount,
        }
    }
}

/// A priced offer for buying a specific base-unit amount of an asset.
///
/// A quote is immutable once received; the flow only stores, compares and displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyQuote {
    pub asset_data: AssetData,
    /// The amount being bought, in the asset's base units.
    pub asset_buy_amount: BigUint,
    /// Pricing if the best available orders fill.
    pub best_case_quote_info: BuyQuoteInfo,
    /// Pricing under the maximum slippage the provider allows.
    pub worst_case_quote_info: BuyQuoteInfo,
    /// Fee as a fraction of the asset cost, in basis points.
    pub fee_basis_points: u32,
}

impl BuyQuote {
    /// Returns `true` if this quote was priced for exactly `asset_data` and `amount`.
    pub fn is_for(&self, asset_data: &AssetData, amount: &BigUint) -> bool {
        &self.asset_data == asset_data && &self.asset_buy_amount == amount
    }
}
