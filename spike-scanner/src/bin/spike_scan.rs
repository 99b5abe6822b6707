/// One-shot volume spike scan
///
/// Runs a single scan over Binance USDT perpetuals and prints the result to stdout.
///
/// Environment:
/// - `SPIKE_*`: scanner overrides, see `ScannerConfig::from_env`
/// - `SPIKE_OUTPUT=json`: print the full `ScanReport` as JSON instead of a table
/// - `SPIKE_LOG_FORMAT=json`: structured JSON logs on stderr
/// - `RUST_LOG`: log filter (default: info)
use std::error::Error;

use spike_scanner::{Scanner, ScannerConfig, init_json_logging, init_logging};
use tracing::info;

fn json_output() -> bool {
    std::env::var("SPIKE_OUTPUT").is_ok_and(|value| value.eq_ignore_ascii_case("json"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    if std::env::var("SPIKE_LOG_FORMAT").is_ok_and(|value| value.eq_ignore_ascii_case("json")) {
        init_json_logging();
    } else {
        init_logging();
    }

    let config = ScannerConfig::from_env();
    info!(base_url = %config.base_url, "Starting one-shot volume spike scan");

    let scanner = Scanner::binance(config)?;
    let report = scanner.scan().await?;

    if json_output() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_table());
        println!("{}", report.summary_line());
    }

    Ok(())
}
