//! Scanner configuration.
//!
//! Every field has a default matching the Binance USDⓈ-M 15m scan and can be
//! overridden through a `SPIKE_*` environment variable via [`ScannerConfig::from_env`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};

/// Default Binance USDⓈ-M futures REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";

/// Default kline interval.
pub const DEFAULT_INTERVAL: &str = "15m";

/// Default number of klines requested per symbol (current interval included).
pub const DEFAULT_LIMIT: u16 = 500;

/// Largest `limit` the Binance futures klines endpoint accepts.
pub const MAX_LIMIT: u16 = 1500;

/// Default absolute floor on the current interval's quote volume ($100M).
pub const DEFAULT_MIN_QUOTE_VOLUME: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Default relative multiplier over the trailing average.
pub const DEFAULT_SPIKE_MULTIPLIER: Decimal = Decimal::TEN;

/// Default lifetime of the cached symbol universe.
pub const DEFAULT_SYMBOL_TTL: Duration = Duration::from_secs(5 * 60);

/// Default per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Thresholds a symbol's current interval must clear to count as a spike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpikeThresholds {
    /// Absolute quote volume floor
    pub min_quote_volume: Decimal,
    /// Required multiple of the trailing average
    pub multiplier: Decimal,
}

impl Default for SpikeThresholds {
    fn default() -> Self {
        Self {
            min_quote_volume: DEFAULT_MIN_QUOTE_VOLUME,
            multiplier: DEFAULT_SPIKE_MULTIPLIER,
        }
    }
}

impl SpikeThresholds {
    pub fn new(min_quote_volume: Decimal, multiplier: Decimal) -> Self {
        Self {
            min_quote_volume,
            multiplier,
        }
    }

    /// Both bounds are inclusive. A relative bound too large to represent is never cleared.
    pub fn is_spike(&self, current: Decimal, avg: Decimal) -> bool {
        current >= self.min_quote_volume
            && self
                .multiplier
                .checked_mul(avg)
                .is_some_and(|required| current >= required)
    }
}

/// Spike scanner configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScannerConfig {
    /// REST base URL, without trailing slash
    pub base_url: String,
    /// Kline interval, eg/ "15m"
    pub interval: String,
    /// Klines requested per symbol
    pub limit: u16,
    /// Quote asset the symbol universe is restricted to
    pub quote_asset: String,
    /// Contract type the symbol universe is restricted to
    pub contract_type: String,
    /// Spike classification thresholds
    pub thresholds: SpikeThresholds,
    /// How long a fetched symbol universe stays fresh
    pub symbol_ttl: Duration,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// Symbols evaluated concurrently (1 = strictly sequential)
    pub max_concurrency: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            interval: DEFAULT_INTERVAL.to_string(),
            limit: DEFAULT_LIMIT,
            quote_asset: "USDT".to_string(),
            contract_type: "PERPETUAL".to_string(),
            thresholds: SpikeThresholds::default(),
            symbol_ttl: DEFAULT_SYMBOL_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_concurrency: 1,
        }
    }
}

impl ScannerConfig {
    /// Create a new configuration with a custom REST base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Build a configuration from defaults overridden by `SPIKE_*` environment variables.
    ///
    /// Missing or unparsable variables keep their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = std::env::var("SPIKE_BASE_URL").unwrap_or(defaults.base_url);

        Self::new(base_url)
            .with_interval(std::env::var("SPIKE_INTERVAL").unwrap_or(defaults.interval))
            .with_limit(env_or("SPIKE_LIMIT", defaults.limit))
            .with_quote_asset(std::env::var("SPIKE_QUOTE_ASSET").unwrap_or(defaults.quote_asset))
            .with_thresholds(SpikeThresholds::new(
                env_or("SPIKE_MIN_QUOTE_VOLUME", DEFAULT_MIN_QUOTE_VOLUME),
                env_or("SPIKE_MULTIPLIER", DEFAULT_SPIKE_MULTIPLIER),
            ))
            .with_symbol_ttl(Duration::from_secs(env_or(
                "SPIKE_SYMBOL_TTL_SECS",
                DEFAULT_SYMBOL_TTL.as_secs(),
            )))
            .with_request_timeout(Duration::from_secs(env_or(
                "SPIKE_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT.as_secs(),
            )))
            .with_max_concurrency(env_or("SPIKE_MAX_CONCURRENCY", defaults.max_concurrency))
    }

    /// Set kline interval
    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = interval.into();
        self
    }

    /// Set klines requested per symbol, clamped to `1..=MAX_LIMIT`
    pub fn with_limit(mut self, limit: u16) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    /// Set quote asset filter
    pub fn with_quote_asset(mut self, quote_asset: impl Into<String>) -> Self {
        self.quote_asset = quote_asset.into().to_uppercase();
        self
    }

    /// Set spike thresholds
    pub fn with_thresholds(mut self, thresholds: SpikeThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set symbol universe freshness window
    pub fn with_symbol_ttl(mut self, ttl: Duration) -> Self {
        self.symbol_ttl = ttl;
        self
    }

    /// Set per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set concurrent symbol evaluations, clamped to at least 1
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert_eq!(config.base_url, "https://fapi.binance.com");
        assert_eq!(config.interval, "15m");
        assert_eq!(config.limit, 500);
        assert_eq!(config.quote_asset, "USDT");
        assert_eq!(config.contract_type, "PERPETUAL");
        assert_eq!(config.thresholds.min_quote_volume, dec!(100000000));
        assert_eq!(config.thresholds.multiplier, dec!(10));
        assert_eq!(config.symbol_ttl, Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn test_config_builder() {
        let config = ScannerConfig::new("http://localhost:8080/")
            .with_interval("5m")
            .with_limit(100)
            .with_quote_asset("usdc")
            .with_thresholds(SpikeThresholds::new(dec!(1000), dec!(3)))
            .with_symbol_ttl(Duration::from_secs(30))
            .with_request_timeout(Duration::from_secs(2))
            .with_max_concurrency(0);

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.interval, "5m");
        assert_eq!(config.limit, 100);
        assert_eq!(config.quote_asset, "USDC");
        assert_eq!(config.thresholds.min_quote_volume, dec!(1000));
        assert_eq!(config.thresholds.multiplier, dec!(3));
        assert_eq!(config.symbol_ttl, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn test_config_limit_clamped_to_binance_range() {
        assert_eq!(ScannerConfig::default().with_limit(0).limit, 1);
        assert_eq!(ScannerConfig::default().with_limit(5000).limit, MAX_LIMIT);
        assert_eq!(ScannerConfig::default().with_limit(1500).limit, 1500);
    }

    #[test]
    fn test_thresholds_is_spike() {
        struct TestCase {
            current: Decimal,
            avg: Decimal,
            expected: bool,
        }

        let thresholds = SpikeThresholds::default();

        let tests = vec![
            TestCase {
                // TC0: below floor, huge ratio
                current: dec!(99999999),
                avg: dec!(1),
                expected: false,
            },
            TestCase {
                // TC1: at floor, exactly 10x
                current: dec!(100000000),
                avg: dec!(10000000),
                expected: true,
            },
            TestCase {
                // TC2: above floor, just under 10x
                current: dec!(100000000),
                avg: dec!(10000000.01),
                expected: false,
            },
            TestCase {
                // TC3: above floor, zero average
                current: dec!(250000000),
                avg: dec!(0),
                expected: true,
            },
            TestCase {
                // TC4: multiplier x average overflows
                current: Decimal::MAX,
                avg: Decimal::MAX,
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = thresholds.is_spike(test.current, test.avg);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }
}
