use crate::{
    error::ScanError,
    model::{SkippedSymbol, SpikeMatch},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Write};

/// Column headers of the spike table.
pub const TABLE_HEADERS: [&str; 4] = [
    "Symbol",
    "Time",
    "Current Quote Volume ($)",
    "Avg Quote Volume ($)",
];

/// Notice shown when a scan found no spikes.
pub const NO_SPIKES_NOTICE: &str = "No volume spikes detected.";

/// Format of the `Time` column.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of one scan: matches plus every symbol that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Symbols attempted, matched or not
    pub symbols_scanned: usize,
    pub matches: Vec<SpikeMatch>,
    pub skipped: Vec<SkippedSymbol>,
}

impl ScanReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            symbols_scanned: 0,
            matches: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Fold one symbol's outcome into the report.
    pub fn record(&mut self, symbol: &str, outcome: Result<Option<SpikeMatch>, ScanError>) {
        self.symbols_scanned += 1;
        match outcome {
            Ok(Some(spike)) => self.matches.push(spike),
            Ok(None) => {}
            Err(reason) => self.skipped.push(SkippedSymbol {
                symbol: symbol.to_string(),
                reason,
            }),
        }
    }

    pub fn finish(mut self, finished_at: DateTime<Utc>) -> Self {
        self.finished_at = finished_at;
        self
    }

    /// True when no spikes were found.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Matches sorted by current quote volume, largest first (ties by symbol).
    pub fn sorted_matches(&self) -> Vec<SpikeMatch> {
        let mut matches = self.matches.clone();
        matches.sort_by(|a, b| {
            b.current_quote_volume
                .cmp(&a.current_quote_volume)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        matches
    }

    /// Skipped symbol count per [`ScanError::kind`].
    pub fn skip_summary(&self) -> BTreeMap<&'static str, usize> {
        self.skipped
            .iter()
            .fold(BTreeMap::new(), |mut summary, skipped| {
                *summary.entry(skipped.reason.kind()).or_insert(0) += 1;
                summary
            })
    }

    /// One line, eg/ "scanned 312 symbols in 41.2s, 2 spike(s), 3 skipped (request: 2, status: 1)".
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "scanned {} symbols in {:.1}s, {} spike(s), {} skipped",
            self.symbols_scanned,
            self.elapsed().num_milliseconds() as f64 / 1000.0,
            self.matches.len(),
            self.skipped.len()
        );

        if !self.skipped.is_empty() {
            let kinds = self
                .skip_summary()
                .into_iter()
                .map(|(kind, count)| format!("{kind}: {count}"))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(line, " ({kinds})");
        }

        line
    }

    /// Plain-text rendering: a headline plus the sorted table, or the no-spikes notice.
    pub fn render_table(&self) -> String {
        if self.is_empty() {
            return format!("{NO_SPIKES_NOTICE}\n");
        }

        let rows = self
            .sorted_matches()
            .iter()
            .map(table_row)
            .collect::<Vec<_>>();

        let widths = TABLE_HEADERS.map(str::len);
        let widths = rows.iter().fold(widths, |mut widths, row| {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
            widths
        });

        let mut out = format!("Found {} spike(s)!\n", rows.len());
        push_row(&mut out, &TABLE_HEADERS.map(String::from), &widths);
        push_row(&mut out, &widths.map(|width| "-".repeat(width)), &widths);
        for row in &rows {
            push_row(&mut out, row, &widths);
        }
        out
    }
}

/// Display cells of one match, in [`TABLE_HEADERS`] order.
pub fn table_row(spike: &SpikeMatch) -> [String; 4] {
    [
        spike.symbol.clone(),
        spike.time.format(TIME_FORMAT).to_string(),
        spike.current_quote_volume.to_string(),
        spike.avg_quote_volume.to_string(),
    ]
}

fn push_row(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let _ = writeln!(
        out,
        "{:<w0$}  {:<w1$}  {:>w2$}  {:>w3$}",
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
    );
}
