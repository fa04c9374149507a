//! Handles the caching logic for quotes obtained from an external provider.

use crate::asset::AssetData;
use crate::buy_quote::BuyQuote;
use crate::quote_providers::{QuoteError, QuoteProvider};
use futures::future::BoxFuture;
use num_bigint::BigUint;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

type CacheKey = (AssetData, BigUint);

#[derive(Clone, Debug)]
struct CachedQuote {
    quote: BuyQuote,
    fetched_at: Instant,
}

/// Wraps a provider with a lazy, time-based cache of successful quotes.
///
/// This acts as a gatekeeper to the underlying provider. It only calls the provider
/// when no quote for the same asset and amount was fetched within `ttl`. Failures
/// are never cached.
///
/// No lock is held while the provider is awaited, so a slow request for one amount
/// never delays a request for another. Concurrent misses for the same key may each
/// reach the provider; the last one to finish wins the cache slot.
pub struct CachingQuoteProvider<P> {
    inner: P,
    ttl: Duration,
    cache: RwLock<HashMap<CacheKey, CachedQuote>>,
}

impl<P: QuoteProvider> CachingQuoteProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn fresh(&self, entry: Option<&CachedQuote>) -> Option<BuyQuote> {
        entry
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.quote.clone())
    }

    async fn get_cached(
        &self,
        asset_data: &AssetData,
        base_unit_amount: &BigUint,
    ) -> Result<BuyQuote, QuoteError> {
        let key = (asset_data.clone(), base_unit_amount.clone());

        let read_lock = self.cache.read().await;
        if let Some(quote) = self.fresh(read_lock.get(&key)) {
            tracing::debug!(%asset_data, %base_unit_amount, "serving cached quote");
            return Ok(quote);
        }
        drop(read_lock);

        let quote = self
            .inner
            .get_buy_quote(asset_data, base_unit_amount)
            .await?;

        let mut write_lock = self.cache.write().await;
        let ttl = self.ttl;
        write_lock.retain(|_, cached| cached.fetched_at.elapsed() < ttl);
        write_lock.insert(
            key,
            CachedQuote {
                quote: quote.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(quote)
    }
}

impl<P: QuoteProvider> QuoteProvider for CachingQuoteProvider<P> {
    fn get_buy_quote<'a>(
        &'a self,
        asset_data: &'a AssetData,
        base_unit_amount: &'a BigUint,
    ) -> BoxFuture<'a, Result<BuyQuote, QuoteError>> {
        Box::pin(self.get_cached(asset_data, base_unit_amount))
    }
}
