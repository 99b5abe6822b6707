use crate::{client::MarketDataSource, error::ScanError};
use std::time::Duration;
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, info};

/// Time-bounded cache of the scanned symbol universe.
///
/// Holds the last fetched list together with its fetch time. A read inside the TTL is served
/// from memory, a read after it refetches. The lock is held across a refresh so concurrent
/// scans issue at most one discovery request. Share it process-wide behind an `Arc`.
#[derive(Debug)]
pub struct SymbolCache {
    ttl: Duration,
    entry: Mutex<Option<CachedSymbols>>,
}

#[derive(Debug)]
struct CachedSymbols {
    symbols: Vec<String>,
    fetched_at: Instant,
}

impl CachedSymbols {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

impl SymbolCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached symbols if still fresh, otherwise fetch them from `source`.
    ///
    /// A failed fetch leaves any previous (stale) entry in place and is returned to the caller.
    pub async fn get_or_refresh<Source>(&self, source: &Source) -> Result<Vec<String>, ScanError>
    where
        Source: MarketDataSource + ?Sized,
    {
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref().filter(|cached| cached.is_fresh(self.ttl)) {
            debug!(
                symbols = cached.symbols.len(),
                age_secs = cached.fetched_at.elapsed().as_secs(),
                "serving cached symbol universe"
            );
            return Ok(cached.symbols.clone());
        }

        let symbols = source.fetch_symbols().await?;
        info!(symbols = symbols.len(), "refreshed symbol universe");

        *entry = Some(CachedSymbols {
            symbols: symbols.clone(),
            fetched_at: Instant::now(),
        });

        Ok(symbols)
    }

    /// Cached symbols if present and fresh, without touching the source.
    pub async fn peek(&self) -> Option<Vec<String>> {
        self.entry
            .lock()
            .await
            .as_ref()
            .filter(|cached| cached.is_fresh(self.ttl))
            .map(|cached| cached.symbols.clone())
    }

    /// Time since the cached entry was fetched, if any.
    pub async fn age(&self) -> Option<Duration> {
        self.entry
            .lock()
            .await
            .as_ref()
            .map(|cached| cached.fetched_at.elapsed())
    }

    /// Drop the cached entry so the next read refetches.
    pub async fn invalidate(&self) {
        if self.entry.lock().await.take().is_some() {
            debug!("invalidated symbol universe cache");
        }
    }
}

impl Default for SymbolCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SYMBOL_TTL)
    }
}
