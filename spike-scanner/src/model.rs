use crate::error::ScanError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::IgnoredAny};
use std::str::FromStr;

/// Normalised kline (candle) for one interval.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Kline {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Base asset volume
    pub volume: Decimal,
    pub close_time: DateTime<Utc>,
    /// Quote asset volume (turnover)
    pub quote_volume: Decimal,
    pub trades: u64,
    pub taker_buy_base_volume: Decimal,
    pub taker_buy_quote_volume: Decimal,
}

/// A symbol whose current interval cleared both spike thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpikeMatch {
    pub symbol: String,
    /// Open time of the triggering interval
    pub time: DateTime<Utc>,
    /// Current quote volume, rounded to 2dp
    pub current_quote_volume: Decimal,
    /// Trailing average quote volume excluding the current interval, rounded to 2dp
    pub avg_quote_volume: Decimal,
    /// `current / avg`, rounded to 2dp (zero when the average is zero)
    pub ratio: Decimal,
}

/// A symbol left out of a scan, and why.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: ScanError,
}

/// Binance [`klines`](https://developers.binance.com/docs/derivatives/usds-margined-futures/market-data/rest-api/Kline-Candlestick-Data)
/// response row.
#[derive(Debug, Deserialize)]
pub struct BinanceKline(
    i64,         // 0: Open time
    String,      // 1: Open
    String,      // 2: High
    String,      // 3: Low
    String,      // 4: Close
    String,      // 5: Volume
    i64,         // 6: Close time
    String,      // 7: Quote asset volume
    u64,         // 8: Number of trades
    String,      // 9: Taker buy base asset volume
    String,      // 10: Taker buy quote asset volume
    IgnoredAny,  // 11: Ignore
);

impl TryFrom<BinanceKline> for Kline {
    type Error = ScanError;

    fn try_from(kline: BinanceKline) -> Result<Self, Self::Error> {
        Ok(Self {
            open_time: datetime_from_millis("open_time", kline.0)?,
            open: parse_decimal("open", &kline.1)?,
            high: parse_decimal("high", &kline.2)?,
            low: parse_decimal("low", &kline.3)?,
            close: parse_decimal("close", &kline.4)?,
            volume: parse_decimal("volume", &kline.5)?,
            close_time: datetime_from_millis("close_time", kline.6)?,
            quote_volume: parse_decimal("quote_volume", &kline.7)?,
            trades: kline.8,
            taker_buy_base_volume: parse_decimal("taker_buy_base", &kline.9)?,
            taker_buy_quote_volume: parse_decimal("taker_buy_quote", &kline.10)?,
        })
    }
}

/// Binance `exchangeInfo` response, reduced to the fields used for symbol discovery.
#[derive(Debug, Deserialize)]
pub struct BinanceExchangeInfo {
    pub symbols: Vec<BinanceSymbolInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceSymbolInfo {
    pub symbol: String,
    #[serde(rename = "contractType", default)]
    pub contract_type: String,
    #[serde(rename = "quoteAsset", default)]
    pub quote_asset: String,
}

impl BinanceExchangeInfo {
    /// Symbols matching the contract type and quote asset, in exchange order.
    pub fn filter_symbols(&self, contract_type: &str, quote_asset: &str) -> Vec<String> {
        self.symbols
            .iter()
            .filter(|info| info.contract_type == contract_type && info.quote_asset == quote_asset)
            .map(|info| info.symbol.clone())
            .collect()
    }
}

/// Decode a raw `klines` body into normalised [`Kline`]s, oldest first.
pub fn decode_klines(body: &str) -> Result<Vec<Kline>, ScanError> {
    serde_json::from_str::<Vec<BinanceKline>>(body)?
        .into_iter()
        .map(Kline::try_from)
        .collect()
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, ScanError> {
    Decimal::from_str(raw)
        .map_err(|error| ScanError::Decode(format!("invalid {field} '{raw}': {error}")))
}

fn datetime_from_millis(field: &str, millis: i64) -> Result<DateTime<Utc>, ScanError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| ScanError::Decode(format!("invalid {field} timestamp {millis}")))
}
