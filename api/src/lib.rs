//! This crate contains the pricing side of the instant-buy flow: assets, exact token
//! amounts, buy quotes, and the providers that produce them.

pub mod asset;
pub mod buy_quote;
pub mod prefs;
pub mod quote_caching;
pub mod quote_providers;
pub mod token_amount;

use std::sync::Arc;

use prefs::quote_prefs::QuotePrefs;
use quote_caching::CachingQuoteProvider;
use quote_providers::fixed_rate::FixedRate;
use quote_providers::offline::Offline;
use quote_providers::{QuoteProvider, QuoteProviderKind};

/// Builds the provider selected in `prefs`, wrapped in a cache when caching is enabled.
///
/// `fixed_rate` configures the provider used for `QuoteProviderKind::FixedRate`.
pub fn build_quote_provider(prefs: &QuotePrefs, fixed_rate: FixedRate) -> Arc<dyn QuoteProvider> {
    match (prefs.provider, prefs.quote_cache_ttl) {
        (QuoteProviderKind::FixedRate, Some(ttl)) => {
            Arc::new(CachingQuoteProvider::new(fixed_rate, ttl))
        }
        (QuoteProviderKind::FixedRate, None) => Arc::new(fixed_rate),
        (QuoteProviderKind::Offline, _) => Arc::new(Offline),
    }
}
