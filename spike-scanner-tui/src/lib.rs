/// Spike Scanner TUI - Shared Library
///
/// State behind the `spike-dashboard` binary: scan lifecycle, headline text and table rows.
/// Rendering lives in the binary, the scan itself in `spike-scanner`.
pub mod state;

pub use state::{DashboardState, Headline, ScanStatus, Tone};
