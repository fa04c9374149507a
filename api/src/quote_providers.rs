//! Defines the trait and implementations for external buy-quote providers.

use crate::asset::AssetData;
use crate::buy_quote::BuyQuote;
use futures::future::BoxFuture;
use num_bigint::BigUint;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Why a quote could not be produced.
///
/// Providers map whatever went wrong on their side onto one of these variants, so
/// callers can discriminate causes without inspecting strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// The provider could not be reached or the connection dropped.
    #[error("network error: {0}")]
    Network(String),
    /// The provider refused to price the request.
    #[error("quote rejected: {0}")]
    Rejected(String),
    /// There is not enough of the asset on offer to fill the requested amount.
    #[error("insufficient asset liquidity")]
    InsufficientAssetLiquidity,
    #[error("unknown quote error: {0}")]
    Unknown(String),
}

/// Selects which built-in provider a driver should construct.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::EnumIs,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum QuoteProviderKind {
    #[default]
    #[strum(serialize = "fixed-rate", serialize = "fixed")]
    FixedRate,
    /// Always fails with a network error. Useful for exercising failure handling.
    #[strum(serialize = "offline")]
    Offline,
}

/// A service that can price the purchase of an asset.
///
/// The trait is object safe so the shared state can hold an
/// `Arc<dyn QuoteProvider>` regardless of the concrete provider.
pub trait QuoteProvider: Send + Sync {
    /// Fetches a quote for buying `base_unit_amount` base units of the asset
    /// identified by `asset_data`.
    fn get_buy_quote<'a>(
        &'a self,
        asset_data: &'a AssetData,
        base_unit_amount: &'a BigUint,
    ) -> BoxFuture<'a, Result<BuyQuote, QuoteError>>;
}

/// Provides quotes at a fixed wei price per base unit.
pub mod fixed_rate {
    use super::*;
    use crate::buy_quote::BuyQuoteInfo;
    use num_traits::Zero;
    use std::time::Duration;

    const BASIS_POINTS: u32 = 10_000;

    /// A deterministic provider pricing every base unit at `wei_per_base_unit`.
    ///
    /// An optional liquidity cap makes larger requests fail with
    /// `QuoteError::InsufficientAssetLiquidity`, and an optional latency simulates the
    /// network round trip.
    #[derive(Debug, Clone)]
    pub struct FixedRate {
        pub wei_per_base_unit: BigUint,
        pub fee_basis_points: u32,
        pub worst_case_slippage_basis_points: u32,
        pub liquidity: Option<BigUint>,
        pub latency: Duration,
    }

    impl FixedRate {
        pub fn new(wei_per_base_unit: BigUint) -> Self {
            Self {
                wei_per_base_unit,
                fee_basis_points: 0,
                worst_case_slippage_basis_points: 0,
                liquidity: None,
                latency: Duration::ZERO,
            }
        }

        pub fn with_fee(mut self, fee_basis_points: u32) -> Self {
            self.fee_basis_points = fee_basis_points;
            self
        }

        pub fn with_slippage(mut self, worst_case_slippage_basis_points: u32) -> Self {
            self.worst_case_slippage_basis_points = worst_case_slippage_basis_points;
            self
        }

        pub fn with_liquidity(mut self, liquidity: BigUint) -> Self {
            self.liquidity = Some(liquidity);
            self
        }

        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        fn price(&self, asset_data: &AssetData, amount: &BigUint) -> Result<BuyQuote, QuoteError> {
            if amount.is_zero() {
                return Err(QuoteError::Rejected(
                    "amount must be greater than zero".to_string(),
                ));
            }
            if let Some(liquidity) = &self.liquidity {
                if amount > liquidity {
                    return Err(QuoteError::InsufficientAssetLiquidity);
                }
            }

            let scale = |value: &BigUint, basis_points: u32| {
                value * BigUint::from(basis_points) / BigUint::from(BASIS_POINTS)
            };

            let best_cost = amount * &self.wei_per_base_unit;
            let worst_cost =
                scale(&best_cost, BASIS_POINTS + self.worst_case_slippage_basis_points);
            let best_fee = scale(&best_cost, self.fee_basis_points);
            let worst_fee = scale(&worst_cost, self.fee_basis_points);

            Ok(BuyQuote {
                asset_data: asset_data.clone(),
                asset_buy_amount: amount.clone(),
                best_case_quote_info: BuyQuoteInfo::new(best_cost, best_fee),
                worst_case_quote_info: BuyQuoteInfo::new(worst_cost, worst_fee),
                fee_basis_points: self.fee_basis_points,
            })
        }
    }

    impl QuoteProvider for FixedRate {
        fn get_buy_quote<'a>(
            &'a self,
            asset_data: &'a AssetData,
            base_unit_amount: &'a BigUint,
        ) -> BoxFuture<'a, Result<BuyQuote, QuoteError>> {
            Box::pin(async move {
                if !self.latency.is_zero() {
                    tokio::time::sleep(self.latency).await;
                }
                self.price(asset_data, base_unit_amount)
            })
        }
    }
}

/// A provider that never answers successfully.
pub mod offline {
    use super::*;

    pub struct Offline;

    impl QuoteProvider for Offline {
        fn get_buy_quote<'a>(
            &'a self,
            _asset_data: &'a AssetData,
            _base_unit_amount: &'a BigUint,
        ) -> BoxFuture<'a, Result<BuyQuote, QuoteError>> {
            Box::pin(async { Err(QuoteError::Network("provider is offline".to_string())) })
        }
    }
}
