mod api;
mod config;
mod demo;
mod forms;
mod listing;
mod models;
mod session;
mod source;
mod status;
mod tui;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use api::{ActivityApi, KindHeartsClient};
use config::Config;
use session::SessionStore;
use source::{notice_channel, ActivitySource};
use tui::{App, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--init") {
        let path = Config::generate_default()?;
        println!("Generated config file at: {}", path.display());
        println!("Edit it with your backend URL and ids, then run kind-hearts.");
        return Ok(());
    }

    if args.iter().any(|a| a == "--logout") {
        SessionStore::default_location()?.clear();
        println!("Signed out.");
        return Ok(());
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("kind-hearts: a terminal client for the Kind Hearts learning platform");
        println!();
        println!("USAGE:");
        println!("  kind-hearts            Start the TUI");
        println!("  kind-hearts --init     Generate a default config file");
        println!("  kind-hearts --logout   Forget the saved session");
        println!();
        println!("CONFIG:");
        println!("  File: ~/.config/kind-hearts/config.toml");
        println!("  Or set env vars: KIND_HEARTS_API_URL, KIND_HEARTS_STUDENT_ID, KIND_HEARTS_TEACHER_ID");
        println!();
        println!("KEYBINDINGS:");
        println!("  Tab / Shift+Tab   Switch pages");
        println!("  j / k / Up / Down Move through a list");
        println!("  h / l / 1-9       Previous / next / jump to page");
        println!("  /                 Search");
        println!("  Enter             Open the selected activity");
        println!("  L                 Log out");
        println!("  q / Ctrl+C        Quit");
        return Ok(());
    }

    let config = Config::load().with_context(|| {
        "Failed to load configuration.\n\
         Run `kind-hearts --init` to generate a config file,\n\
         or set the KIND_HEARTS_API_URL environment variable."
    })?;

    init_logging(&config.log_level)?;
    tracing::info!(api = %config.api_url, fallback = ?config.fallback, "starting");

    let client = KindHeartsClient::new(&config.api_url, config.accept_invalid_certs)?;
    let store = SessionStore::default_location()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, config, client, store).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!(error = %e, "exited with error");
        eprintln!("Error: {e:#}");
    }

    Ok(())
}

/// The TUI owns stdout, so logs go to a file in the cache directory.
fn init_logging(level: &str) -> Result<()> {
    let dir = dirs::cache_dir()
        .context("Could not determine cache directory")?
        .join("kind-hearts");
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("kind-hearts.log"))
        .with_context(|| format!("Failed to open log file in {}", dir.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kind_hearts={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
    client: KindHeartsClient,
    store: SessionStore,
) -> Result<()> {
    let (tx, rx) = notice_channel();
    let api: Arc<dyn ActivityApi> = Arc::new(client);
    let settings = Settings {
        student_id: config.student_id,
        teacher_id: config.teacher_id,
        fallback: config.fallback,
        session_hours: config.session_hours,
    };

    let mut app = App::new(ActivitySource::new(api, tx), rx, store, settings);
    app.start();

    loop {
        app.tick();
        terminal.draw(|f| tui::ui::render(f, &app))?;

        if let Some(event) = tui::event::poll_event(Duration::from_millis(100))? {
            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) = event
            {
                tui::event::handle_key(&mut app, code, modifiers);
            }
        }

        if !app.running {
            break;
        }
    }

    Ok(())
}
