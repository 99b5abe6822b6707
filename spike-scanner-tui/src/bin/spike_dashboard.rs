/// Volume Spike Dashboard
///
/// Manually refreshed view of Binance USDT perpetuals whose current 15m quote volume spiked
/// above both the absolute floor and the trailing-average multiple.
///
/// Keys: `r` scan now, `q`/`Esc` quit.
use std::{
    error::Error,
    fs::File,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};
use spike_scanner::{Scanner, ScannerConfig, report::TABLE_HEADERS};
use spike_scanner_tui::{DashboardState, Tone};
use tokio::sync::Mutex;
use tracing::{info, warn};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Get log file path from SPIKE_LOG_FILE env var (default: spike-dashboard.log)
fn get_log_file() -> String {
    std::env::var("SPIKE_LOG_FILE").unwrap_or_else(|_| "spike-dashboard.log".to_string())
}

/// Log to a file so tracing output does not corrupt the terminal
fn init_logging() -> io::Result<()> {
    let file = File::create(get_log_file())?;
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging()?;

    let config = ScannerConfig::from_env();
    info!(base_url = %config.base_url, "Starting volume spike dashboard");
    let scanner = Arc::new(Scanner::binance(config)?);
    let state = Arc::new(Mutex::new(DashboardState::new()));

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        if last_tick.elapsed() >= tick_rate {
            {
                let guard = state.lock().await;
                terminal.draw(|f| render_ui(f, &guard))?;
            }
            last_tick = Instant::now();
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('r') => request_scan(&scanner, &state).await,
                    _ => {}
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Start a background scan unless one is already running
async fn request_scan<Source>(scanner: &Arc<Scanner<Source>>, state: &Arc<Mutex<DashboardState>>)
where
    Source: spike_scanner::MarketDataSource + 'static,
{
    if !state.lock().await.begin_scan() {
        warn!("Refresh ignored, scan already running");
        return;
    }

    let scanner = Arc::clone(scanner);
    let state = Arc::clone(state);
    tokio::spawn(async move {
        let result = scanner.scan().await;
        state.lock().await.finish_scan(result);
    });
}

fn render_ui(f: &mut Frame, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_title(f, chunks[0]);
    render_headline(f, state, chunks[1]);
    render_spikes(f, state, chunks[2]);
    render_footer(f, state, chunks[3]);
}

fn render_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "BINANCE USDT PERPETUAL VOLUME SPIKE SCANNER",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("[r] refresh  [q] quit", Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

fn render_headline(f: &mut Frame, state: &DashboardState, area: Rect) {
    let headline = state.headline();
    let color = match headline.tone {
        Tone::Info => Color::Gray,
        Tone::Progress => Color::Yellow,
        Tone::Success => Color::Green,
        Tone::Quiet => Color::Cyan,
        Tone::Error => Color::Red,
    };

    let mut spans = Vec::new();
    if let Some(elapsed) = state.scan_elapsed() {
        let frame = SPINNER[(elapsed.as_millis() / 200) as usize % SPINNER.len()];
        spans.push(Span::styled(
            format!("{frame} "),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::styled(headline.text, Style::default().fg(color)));
        spans.push(Span::styled(
            format!(" ({}s)", elapsed.as_secs()),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::styled(
            headline.text,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_spikes(f: &mut Frame, state: &DashboardState, area: Rect) {
    let header_cells = TABLE_HEADERS.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells).height(1);

    let rows = state.rows().into_iter().map(|[symbol, time, current, avg]| {
        Row::new(vec![
            Cell::from(symbol).style(Style::default().add_modifier(Modifier::BOLD)),
            Cell::from(time).style(Style::default().fg(Color::Gray)),
            Cell::from(current).style(Style::default().fg(Color::Green)),
            Cell::from(avg).style(Style::default().fg(Color::Cyan)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Length(21),
            Constraint::Length(26),
            Constraint::Length(22),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" VOLUME SPIKES ")
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, state: &DashboardState, area: Rect) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        state.footer(),
        Style::default().fg(Color::DarkGray),
    )))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}
