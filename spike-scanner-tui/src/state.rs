//! Dashboard state shared between the render loop and the background scan task.
//!
//! The dashboard never scans on its own: a scan starts only when the user asks for one, and a
//! request made while a scan is in flight is dropped.

use spike_scanner::{ScanError, ScanReport, report::table_row};
use std::time::{Duration, Instant};

/// Caption shown before the first scan.
pub const IDLE_CAPTION: &str = "Press r to scan now. The symbol list is refreshed at most every 5 minutes.";

/// Status shown while a scan is running.
pub const SCANNING_CAPTION: &str = "Scanning Binance Futures...";

/// Lifecycle of the current (or most recent) scan.
#[derive(Debug, Clone)]
pub enum ScanStatus {
    /// No scan requested yet
    Idle,
    Scanning { started: Instant },
    /// Last scan completed, see [`DashboardState::report`]
    Ready,
    /// Last scan aborted (symbol discovery failed)
    Failed(ScanError),
}

/// Tone of the headline, mapped to a colour by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Progress,
    Success,
    Quiet,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub tone: Tone,
    pub text: String,
}

#[derive(Debug)]
pub struct DashboardState {
    status: ScanStatus,
    report: Option<ScanReport>,
    scans_completed: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            status: ScanStatus::Idle,
            report: None,
            scans_completed: 0,
        }
    }

    pub fn status(&self) -> &ScanStatus {
        &self.status
    }

    /// Most recent successful report, kept across a later failed scan.
    pub fn report(&self) -> Option<&ScanReport> {
        self.report.as_ref()
    }

    pub fn scans_completed(&self) -> u64 {
        self.scans_completed
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self.status, ScanStatus::Scanning { .. })
    }

    /// Time spent on the running scan, if any.
    pub fn scan_elapsed(&self) -> Option<Duration> {
        match self.status {
            ScanStatus::Scanning { started } => Some(started.elapsed()),
            _ => None,
        }
    }

    /// Mark a scan as started. Returns `false` if one is already running.
    pub fn begin_scan(&mut self) -> bool {
        if self.is_scanning() {
            return false;
        }
        self.status = ScanStatus::Scanning {
            started: Instant::now(),
        };
        true
    }

    pub fn finish_scan(&mut self, result: Result<ScanReport, ScanError>) {
        self.scans_completed += 1;
        match result {
            Ok(report) => {
                self.status = ScanStatus::Ready;
                self.report = Some(report);
            }
            Err(error) => {
                self.status = ScanStatus::Failed(error);
            }
        }
    }

    pub fn headline(&self) -> Headline {
        let (tone, text) = match &self.status {
            ScanStatus::Idle => (Tone::Info, IDLE_CAPTION.to_string()),
            ScanStatus::Scanning { .. } => (Tone::Progress, SCANNING_CAPTION.to_string()),
            ScanStatus::Failed(error) => (Tone::Error, format!("Scan failed: {error}")),
            ScanStatus::Ready => match &self.report {
                Some(report) if !report.is_empty() => (
                    Tone::Success,
                    format!("Found {} spike(s)!", report.matches.len()),
                ),
                _ => (
                    Tone::Quiet,
                    spike_scanner::report::NO_SPIKES_NOTICE.to_string(),
                ),
            },
        };
        Headline { tone, text }
    }

    /// Table rows of the last report, largest current quote volume first.
    pub fn rows(&self) -> Vec<[String; 4]> {
        self.report
            .as_ref()
            .map(|report| report.sorted_matches().iter().map(table_row).collect())
            .unwrap_or_default()
    }

    /// Footer describing the last completed report.
    pub fn footer(&self) -> String {
        match &self.report {
            Some(report) => format!(
                "Last scan {} UTC | {}",
                report.finished_at.format("%Y-%m-%d %H:%M:%S"),
                report.summary_line()
            ),
            None => "No scan completed yet".to_string(),
        }
    }
}
