//! Quote volume spike classification over a single symbol's kline series.
//!
//! The last kline is the current (possibly still forming) interval. It is compared against the
//! mean quote volume of every kline before it, never against itself.

use crate::{
    config::SpikeThresholds,
    error::ScanError,
    model::{Kline, SpikeMatch},
};
use rust_decimal::Decimal;

/// Decimal places reported volumes are rounded to.
pub const REPORT_DP: u32 = 2;

/// Round to [`REPORT_DP`] decimal places (midpoint to even), always carrying that scale.
pub fn round_2dp(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(REPORT_DP);
    rounded.rescale(REPORT_DP);
    rounded
}

/// Mean quote volume of every kline except the last.
pub fn trailing_mean(series: &[Kline]) -> Result<Decimal, ScanError> {
    let (_, prior) = series.split_last().ok_or(ScanError::EmptySeries)?;
    if prior.is_empty() {
        return Err(ScanError::InsufficientHistory);
    }

    let total = prior
        .iter()
        .try_fold(Decimal::ZERO, |total, kline| total.checked_add(kline.quote_volume))
        .ok_or_else(|| ScanError::Overflow("trailing quote volume sum".to_string()))?;

    total
        .checked_div(Decimal::from(prior.len()))
        .ok_or_else(|| ScanError::Overflow("trailing quote volume mean".to_string()))
}

/// Classify `symbol` from its kline series.
///
/// Returns `Ok(None)` for a well-formed series that does not spike.
pub fn evaluate(
    symbol: &str,
    series: &[Kline],
    thresholds: &SpikeThresholds,
) -> Result<Option<SpikeMatch>, ScanError> {
    let current = series.last().ok_or(ScanError::EmptySeries)?;
    let avg = trailing_mean(series)?;

    if !thresholds.is_spike(current.quote_volume, avg) {
        return Ok(None);
    }

    let ratio = if avg.is_zero() {
        Decimal::ZERO
    } else {
        current
            .quote_volume
            .checked_div(avg)
            .map(round_2dp)
            .ok_or_else(|| ScanError::Overflow("spike ratio".to_string()))?
    };

    Ok(Some(SpikeMatch {
        symbol: symbol.to_string(),
        time: current.open_time,
        current_quote_volume: round_2dp(current.quote_volume),
        avg_quote_volume: round_2dp(avg),
        ratio,
    }))
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::model::Kline;
    use chrono::{DateTime, Duration, Utc};
    use rust_decimal::Decimal;

    /// Start of the synthetic series (2024-06-01T00:00:00Z).
    pub const SERIES_START_MS: i64 = 1_717_200_000_000;

    /// 15m klines with the given quote volumes, oldest first. Other fields are placeholders.
    pub fn series(quote_volumes: &[Decimal]) -> Vec<Kline> {
        let start = DateTime::<Utc>::from_timestamp_millis(SERIES_START_MS).unwrap();

        quote_volumes
            .iter()
            .enumerate()
            .map(|(index, quote_volume)| {
                let open_time = start + Duration::minutes(15 * index as i64);
                Kline {
                    open_time,
                    open: Decimal::ONE,
                    high: Decimal::ONE,
                    low: Decimal::ONE,
                    close: Decimal::ONE,
                    volume: *quote_volume,
                    close_time: open_time + Duration::minutes(15) - Duration::milliseconds(1),
                    quote_volume: *quote_volume,
                    trades: 1,
                    taker_buy_base_volume: Decimal::ZERO,
                    taker_buy_quote_volume: Decimal::ZERO,
                }
            })
            .collect()
    }

    /// `prior` klines of `prior_volume` followed by one current kline of `current_volume`.
    pub fn flat_then(prior: usize, prior_volume: Decimal, current_volume: Decimal) -> Vec<Kline> {
        let mut volumes = vec![prior_volume; prior];
        volumes.push(current_volume);
        series(&volumes)
    }
}
