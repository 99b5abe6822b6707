//! Market data sources the [`Scanner`](crate::scanner::Scanner) pulls from.
//!
//! [`BinanceFuturesClient`] talks to the public Binance USDⓈ-M futures REST API. Any other
//! source (eg/ an in-memory fixture) can be scanned by implementing [`MarketDataSource`].

use crate::{
    config::ScannerConfig,
    error::ScanError,
    model::{BinanceExchangeInfo, Kline, decode_klines},
};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Maximum number of error body characters kept in a [`ScanError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Provider of the symbol universe and per-symbol kline series.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Eligible symbols (eg/ USDT-quoted perpetuals).
    async fn fetch_symbols(&self) -> Result<Vec<String>, ScanError>;

    /// Most recent klines for `symbol`, oldest first, current interval last.
    async fn fetch_klines(&self, symbol: &str) -> Result<Vec<Kline>, ScanError>;
}

/// Unauthenticated Binance USDⓈ-M futures REST client.
#[derive(Debug, Clone)]
pub struct BinanceFuturesClient {
    http: Client,
    base_url: String,
    interval: String,
    limit: u16,
    contract_type: String,
    quote_asset: String,
}

impl BinanceFuturesClient {
    pub fn new(config: &ScannerConfig) -> Result<Self, ScanError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| ScanError::Request(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            interval: config.interval.clone(),
            limit: config.limit,
            contract_type: config.contract_type.clone(),
            quote_asset: config.quote_asset.clone(),
        })
    }

    fn exchange_info_url(&self) -> String {
        format!("{}/fapi/v1/exchangeInfo", self.base_url)
    }

    fn klines_url(&self) -> String {
        format!("{}/fapi/v1/klines", self.base_url)
    }

    /// Send a GET request and return the body of a successful response.
    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, ScanError> {
        let response = self.http.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScanError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl MarketDataSource for BinanceFuturesClient {
    async fn fetch_symbols(&self) -> Result<Vec<String>, ScanError> {
        let body = self.get_text(&self.exchange_info_url(), &[]).await?;
        let info: BinanceExchangeInfo = serde_json::from_str(&body)?;
        let symbols = info.filter_symbols(&self.contract_type, &self.quote_asset);

        debug!(
            total = info.symbols.len(),
            eligible = symbols.len(),
            contract_type = %self.contract_type,
            quote_asset = %self.quote_asset,
            "fetched Binance exchange info"
        );

        Ok(symbols)
    }

    async fn fetch_klines(&self, symbol: &str) -> Result<Vec<Kline>, ScanError> {
        let query = [
            ("symbol", symbol.to_string()),
            ("interval", self.interval.clone()),
            ("limit", self.limit.to_string()),
        ];
        let body = self.get_text(&self.klines_url(), &query).await?;
        decode_klines(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binance_client_urls() {
        let config = ScannerConfig::new("http://127.0.0.1:8080/");
        let client = BinanceFuturesClient::new(&config).unwrap();

        assert_eq!(
            client.exchange_info_url(),
            "http://127.0.0.1:8080/fapi/v1/exchangeInfo"
        );
        assert_eq!(client.klines_url(), "http://127.0.0.1:8080/fapi/v1/klines");
        assert_eq!(client.interval, "15m");
        assert_eq!(client.limit, 500);
    }

    #[tokio::test]
    async fn test_binance_client_unreachable_host_is_request_error() {
        // Port 9 (discard) on localhost is expected to refuse the connection
        let config = ScannerConfig::new("http://127.0.0.1:9")
            .with_request_timeout(std::time::Duration::from_secs(2));
        let client = BinanceFuturesClient::new(&config).unwrap();

        let error = client.fetch_klines("BTCUSDT").await.unwrap_err();
        assert!(error.is_transport(), "unexpected error: {error:?}");
    }
}
