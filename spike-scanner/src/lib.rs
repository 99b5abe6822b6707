//! # Spike Scanner
//! Scans Binance USDⓈ-M USDT perpetual futures for sudden quote volume spikes.
//!
//! For every eligible symbol the most recent kline (the current, possibly still forming
//! interval) is compared against the mean quote volume of the klines before it. A symbol is
//! reported as a spike when the current quote volume clears both an absolute floor
//! (default $100M) and a multiple of the trailing average (default 10x).
//!
//! ## Modules
//! - [`config`]: scanner configuration and spike thresholds
//! - [`client`]: [`MarketDataSource`] trait and the Binance REST client
//! - [`cache`]: time-bounded cache of the symbol universe
//! - [`detector`]: trailing average and spike classification
//! - [`scanner`]: one full scan pass producing a [`ScanReport`]
//! - [`report`]: scan outcome, sorting and table rendering
//!
//! ## Example
//! ```rust,no_run
//! use spike_scanner::{ScannerConfig, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scanner = Scanner::binance(ScannerConfig::from_env())?;
//!     let report = scanner.scan().await?;
//!     print!("{}", report.render_table());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod detector;
pub mod error;
pub mod model;
pub mod report;
pub mod scanner;

pub use cache::SymbolCache;
pub use client::{BinanceFuturesClient, MarketDataSource};
pub use config::{ScannerConfig, SpikeThresholds};
pub use error::ScanError;
pub use model::{Kline, SkippedSymbol, SpikeMatch};
pub use report::ScanReport;
pub use scanner::Scanner;

/// Initialise a `tracing` subscriber writing to stderr, filtered by `RUST_LOG` (default: info).
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Initialise a JSON `tracing` subscriber writing to stderr, filtered by `RUST_LOG` (default: info).
pub fn init_json_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
