use crate::quote_providers::QuoteProviderKind;
use serde::Deserialize;
use serde::Serialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Tunables for the quote-input flow.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct QuotePrefs {
    /// Quiet period after the last keystroke before a quote is requested.
    pub quote_debounce: Duration,

    /// How long a failed-quote message stays visible.
    pub error_flash: Duration,

    /// How long a fetched quote may be reused. `None` disables caching.
    pub quote_cache_ttl: Option<Duration>,

    /// The built-in provider a driver should construct.
    pub provider: QuoteProviderKind,
}

impl QuotePrefs {
    pub const DEFAULT_QUOTE_DEBOUNCE_MS: u64 = 200;
    pub const DEFAULT_ERROR_FLASH_MS: u64 = 7_000;
    pub const DEFAULT_QUOTE_CACHE_TTL_MS: u64 = 15_000;

    /// Creates a QuotePrefs instance from environment variables,
    /// with in-code defaults.
    ///
    /// # Environment Variables
    /// - `QUOTE_DEBOUNCE_MS`: quiet period in milliseconds. defaults to 200
    /// - `ERROR_FLASH_MS`: error visibility in milliseconds. defaults to 7000
    /// - `QUOTE_CACHE_TTL_MS`: cache lifetime in milliseconds, `0` disables the
    ///   cache. defaults to 15000
    /// - `QUOTE_PROVIDER`: "fixed-rate" or "offline".
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`QuotePrefs::from_env`] but reads values through `lookup`.
    ///
    /// Unparseable values fall back to the default for that setting.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str, default: u64| {
            lookup(key)
                .and_then(|val| val.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let quote_debounce =
            Duration::from_millis(millis("QUOTE_DEBOUNCE_MS", Self::DEFAULT_QUOTE_DEBOUNCE_MS));
        let error_flash =
            Duration::from_millis(millis("ERROR_FLASH_MS", Self::DEFAULT_ERROR_FLASH_MS));
        let quote_cache_ttl = match millis("QUOTE_CACHE_TTL_MS", Self::DEFAULT_QUOTE_CACHE_TTL_MS)
        {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        let provider = lookup("QUOTE_PROVIDER")
            .and_then(|s| QuoteProviderKind::from_str(s.trim()).ok())
            .unwrap_or_default();

        Self {
            quote_debounce,
            error_flash,
            quote_cache_ttl,
            provider,
        }
    }
}

impl Default for QuotePrefs {
    fn default() -> Self {
        Self::from_env()
    }
}
