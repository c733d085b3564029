//! stockdash TUI: terminal stock dashboard with vim-style navigation.
//!
//! Usage: `stockdash-tui [CONFIG.toml]`. Logs go to the configured log file;
//! `RUST_LOG` overrides the configured filter.

use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use stockdash_core::config::LoggingConfig;
use stockdash_core::{Dashboard, DashboardConfig};
use stockdash_tui::worker::{self, WorkerCommand};
use stockdash_tui::{input, ui, AppState};

fn main() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = DashboardConfig::load(config_path.as_deref()).context("loading configuration")?;
    init_tracing(&config.logging)?;

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let dashboard = Arc::new(Dashboard::from_config(&config).context("building data provider")?);
    let catalog = dashboard.catalog();
    let initial = dashboard.default_selection(chrono::Local::now().date_naive(), config.lookback_days);
    tracing::info!(
        companies = catalog.catalog.len(),
        fallback = catalog.is_fallback(),
        company = %initial.company,
        range = %initial.range,
        "starting dashboard"
    );

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle = worker::spawn_worker(Arc::clone(&dashboard), cmd_rx, resp_tx)
        .context("spawning worker thread")?;

    let mut app = AppState::new(catalog, initial, config.lookback_days, cmd_tx.clone(), resp_rx);
    app.request_refresh();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the main event loop
    let result = run_app(&mut terminal, &mut app);

    // Shutdown worker
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logging.file)
        .with_context(|| format!("opening log file {}", logging.file.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        app.poll_worker();

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}
