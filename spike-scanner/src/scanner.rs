use crate::{
    cache::SymbolCache,
    client::{BinanceFuturesClient, MarketDataSource},
    config::ScannerConfig,
    detector::evaluate,
    error::ScanError,
    model::SpikeMatch,
    report::ScanReport,
};
use chrono::Utc;
use futures::{StreamExt, stream};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Scans a symbol universe for quote volume spikes.
///
/// Every call to [`Scanner::scan`] is an independent pass producing one [`ScanReport`]. The only
/// state kept between passes is the [`SymbolCache`], which may be shared with other scanners.
#[derive(Debug)]
pub struct Scanner<Source> {
    source: Source,
    config: ScannerConfig,
    symbols: Arc<SymbolCache>,
}

impl Scanner<BinanceFuturesClient> {
    /// Scanner over the Binance USDⓈ-M futures REST API.
    pub fn binance(config: ScannerConfig) -> Result<Self, ScanError> {
        let client = BinanceFuturesClient::new(&config)?;
        Ok(Self::new(client, config))
    }
}

impl<Source> Scanner<Source>
where
    Source: MarketDataSource,
{
    /// Create a scanner with its own [`SymbolCache`] using `config.symbol_ttl`.
    pub fn new(source: Source, config: ScannerConfig) -> Self {
        let symbols = Arc::new(SymbolCache::new(config.symbol_ttl));
        Self::with_cache(source, config, symbols)
    }

    /// Create a scanner sharing an existing [`SymbolCache`].
    pub fn with_cache(source: Source, config: ScannerConfig, symbols: Arc<SymbolCache>) -> Self {
        Self {
            source,
            config,
            symbols,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn symbol_cache(&self) -> &Arc<SymbolCache> {
        &self.symbols
    }

    /// Force the next scan to rediscover the symbol universe.
    pub async fn invalidate_symbols(&self) {
        self.symbols.invalidate().await;
    }

    /// Fetch and classify a single symbol.
    pub async fn scan_symbol(&self, symbol: &str) -> Result<Option<SpikeMatch>, ScanError> {
        let klines = self.source.fetch_klines(symbol).await?;
        evaluate(symbol, &klines, &self.config.thresholds)
    }

    /// Run one full pass over the symbol universe.
    ///
    /// Only a symbol discovery failure aborts the pass (as [`ScanError::Discovery`]). Any
    /// per-symbol failure is recorded in [`ScanReport::skipped`] and the pass continues.
    pub async fn scan(&self) -> Result<ScanReport, ScanError> {
        let started_at = Utc::now();

        let symbols = self
            .symbols
            .get_or_refresh(&self.source)
            .await
            .map_err(|discovery_error| {
                error!(%discovery_error, "symbol discovery failed, aborting scan");
                ScanError::Discovery(Box::new(discovery_error))
            })?;

        info!(
            symbols = symbols.len(),
            interval = %self.config.interval,
            limit = self.config.limit,
            max_concurrency = self.config.max_concurrency,
            "starting volume spike scan"
        );

        let mut report = ScanReport::new(started_at);
        let mut outcomes = stream::iter(symbols)
            .map(|symbol| async move {
                let outcome = self.scan_symbol(&symbol).await;
                (symbol, outcome)
            })
            .buffered(self.config.max_concurrency.max(1));

        while let Some((symbol, outcome)) = outcomes.next().await {
            match &outcome {
                Ok(Some(spike)) => info!(
                    symbol = %spike.symbol,
                    current_quote_volume = %spike.current_quote_volume,
                    avg_quote_volume = %spike.avg_quote_volume,
                    ratio = %spike.ratio,
                    "volume spike detected"
                ),
                Ok(None) => debug!(%symbol, "no spike"),
                Err(skip_reason) => warn!(
                    %symbol,
                    kind = skip_reason.kind(),
                    %skip_reason,
                    "skipping symbol"
                ),
            }
            report.record(&symbol, outcome);
        }

        let report = report.finish(Utc::now());
        info!(
            symbols_scanned = report.symbols_scanned,
            spikes = report.matches.len(),
            skipped = report.skipped.len(),
            elapsed_ms = report.elapsed().num_milliseconds(),
            "volume spike scan finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{detector::test_util::flat_then, model::Kline};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    #[derive(Default)]
    struct FixtureSource {
        symbols: Vec<String>,
        klines: HashMap<String, Result<Vec<Kline>, ScanError>>,
        discovery_error: Option<ScanError>,
        discovery_calls: AtomicUsize,
        kline_calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataSource for FixtureSource {
        async fn fetch_symbols(&self) -> Result<Vec<String>, ScanError> {
            self.discovery_calls.fetch_add(1, Ordering::SeqCst);
            match &self.discovery_error {
                Some(error) => Err(error.clone()),
                None => Ok(self.symbols.clone()),
            }
        }

        async fn fetch_klines(&self, symbol: &str) -> Result<Vec<Kline>, ScanError> {
            self.kline_calls.fetch_add(1, Ordering::SeqCst);
            self.klines
                .get(symbol)
                .cloned()
                .unwrap_or_else(|| Err(ScanError::Status {
                    status: 400,
                    body: r#"{"code":-1121,"msg":"Invalid symbol."}"#.to_string(),
                }))
        }
    }

    fn fixture(entries: Vec<(&str, Result<Vec<Kline>, ScanError>)>) -> FixtureSource {
        FixtureSource {
            symbols: entries.iter().map(|(symbol, _)| symbol.to_string()).collect(),
            klines: entries
                .into_iter()
                .map(|(symbol, klines)| (symbol.to_string(), klines))
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_scan_symbol() {
        let source = fixture(vec![(
            "ABCUSDT",
            Ok(flat_then(500, dec!(5000000), dec!(100000000))),
        )]);
        let scanner = Scanner::new(source, ScannerConfig::default());

        let spike = scanner.scan_symbol("ABCUSDT").await.unwrap().unwrap();
        assert_eq!(spike.avg_quote_volume.to_string(), "5000000.00");

        let error = scanner.scan_symbol("NOPEUSDT").await.unwrap_err();
        assert_eq!(error.kind(), "status");
    }

    #[tokio::test]
    async fn test_scan_failures_do_not_abort_later_symbols() {
        let source = fixture(vec![
            ("AAAUSDT", Err(ScanError::Request("timed out".to_string()))),
            ("BBBUSDT", Ok(vec![])),
            ("CCCUSDT", Ok(flat_then(0, dec!(0), dec!(500000000)))),
            ("DDDUSDT", Ok(flat_then(499, dec!(1000000), dec!(300000000)))),
        ]);
        let scanner = Scanner::new(source, ScannerConfig::default());

        let report = scanner.scan().await.unwrap();

        assert_eq!(report.symbols_scanned, 4);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].symbol, "DDDUSDT");

        let skipped = report
            .skipped
            .iter()
            .map(|skipped| (skipped.symbol.as_str(), skipped.reason.kind()))
            .collect::<Vec<_>>();
        assert_eq!(
            skipped,
            vec![
                ("AAAUSDT", "request"),
                ("BBBUSDT", "empty_series"),
                ("CCCUSDT", "insufficient_history"),
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_discovery_failure_aborts() {
        let source = FixtureSource {
            discovery_error: Some(ScanError::Status {
                status: 418,
                body: "banned".to_string(),
            }),
            ..Default::default()
        };
        let scanner = Scanner::new(source, ScannerConfig::default());

        let error = scanner.scan().await.unwrap_err();
        assert!(matches!(error, ScanError::Discovery(_)));
        assert!(error.is_transport());
        assert_eq!(scanner.source.kline_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scan_reuses_cached_symbols_until_invalidated() {
        let source = fixture(vec![(
            "ETHUSDT",
            Ok(flat_then(10, dec!(1000000), dec!(2000000))),
        )]);
        let scanner = Scanner::new(source, ScannerConfig::default());

        scanner.scan().await.unwrap();
        scanner.scan().await.unwrap();
        assert_eq!(scanner.source.discovery_calls.load(Ordering::SeqCst), 1);
        assert_eq!(scanner.source.kline_calls.load(Ordering::SeqCst), 2);

        scanner.invalidate_symbols().await;
        scanner.scan().await.unwrap();
        assert_eq!(scanner.source.discovery_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_scan_concurrent_preserves_symbol_order() {
        let source = fixture(vec![
            ("ZZZUSDT", Ok(flat_then(5, dec!(1000000), dec!(200000000)))),
            ("AAAUSDT", Ok(flat_then(5, dec!(1000000), dec!(300000000)))),
            ("MMMUSDT", Err(ScanError::Decode("bad".to_string()))),
            ("BBBUSDT", Ok(flat_then(5, dec!(1000000), dec!(400000000)))),
        ]);
        let config = ScannerConfig::default().with_max_concurrency(4);
        let scanner = Scanner::new(source, config);

        let report = scanner.scan().await.unwrap();
        let matched = report
            .matches
            .iter()
            .map(|spike| spike.symbol.as_str())
            .collect::<Vec<_>>();
        assert_eq!(matched, vec!["ZZZUSDT", "AAAUSDT", "BBBUSDT"]);
        assert_eq!(report.skipped[0].symbol, "MMMUSDT");
    }

    #[tokio::test]
    async fn test_scanners_share_symbol_cache() {
        let cache = Arc::new(SymbolCache::default());
        let first = Scanner::with_cache(
            fixture(vec![("BTCUSDT", Ok(flat_then(3, dec!(1), dec!(1))))]),
            ScannerConfig::default(),
            Arc::clone(&cache),
        );
        let second = Scanner::with_cache(
            fixture(vec![("ETHUSDT", Ok(flat_then(3, dec!(1), dec!(1))))]),
            ScannerConfig::default(),
            Arc::clone(&cache),
        );

        first.scan().await.unwrap();
        let report = second.scan().await.unwrap();

        // Second scanner is served the universe discovered by the first
        assert_eq!(second.source.discovery_calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.skipped[0].symbol, "BTCUSDT");
        assert_eq!(report.skipped[0].reason.kind(), "status");
    }
}
