//! Marketbook TUI - A terminal client for the marketplace.
//!
//! This application provides a fast, keyboard-driven interface for browsing
//! and filtering listings, contacting sellers, and managing a seller profile.

mod app;
mod form;
mod ui;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use marketbook_core::auth::{CredentialStore, FileStore, SessionManager, SIGN_IN_FALLBACK};
use marketbook_core::validation::SignInForm;
use marketbook_core::{user_message, Config};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix inside the log directory
const LOG_FILE_NAME: &str = "marketbook.log";

/// Environment variables read by `--sign-in`
const EMAIL_ENV: &str = "MARKETBOOK_EMAIL";
const PASSWORD_ENV: &str = "MARKETBOOK_PASSWORD";

fn env_filter() -> EnvFilter {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to stderr, for the non-interactive commands
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

/// Log to a daily file while the TUI owns the terminal.
/// The returned guard flushes the writer when dropped.
fn init_file_tracing(config: &Config) -> Option<WorkerGuard> {
    let log_dir = match config.log_dir() {
        Ok(dir) => dir,
        Err(_) => return None,
    };
    if std::fs::create_dir_all(&log_dir).is_err() {
        return None;
    }

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Some(guard)
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if let Some(command) = args.get(1) {
        init_stderr_tracing();
        let config = load_config();
        return match command.as_str() {
            "--sign-in" => sign_in_command(config).await,
            "--sign-out" => sign_out_command(&config).await,
            "--whoami" => whoami_command(&config).await,
            other => bail!("Unknown option: {} (expected --sign-in, --sign-out or --whoami)", other),
        };
    }

    let config = load_config();
    let _log_guard = init_file_tracing(&config);
    info!("Marketbook TUI starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = match App::new(config) {
        Ok(mut app) => {
            // Restore the session before the first frame
            app.start().await;
            run_app(&mut terminal, &mut app).await
        }
        Err(e) => Err(e),
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Marketbook TUI shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Run a queued submission now that its busy state is on screen
        if app.is_busy() {
            app.run_pending_action().await;
            continue;
        }

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks().await;

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// Non-interactive commands
// ============================================================================

fn session_manager(config: &Config) -> Result<SessionManager> {
    let store = FileStore::new(config.data_dir()?);
    SessionManager::new(&config.api_base_url(), Arc::new(store))
}

fn prompt_email(default: Option<&str>) -> Result<String> {
    match default {
        Some(email) => print!("Email [{}]: ", email),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match default {
        Some(email) if input.is_empty() => email.to_string(),
        _ => input.to_string(),
    })
}

/// Sign in from the terminal and persist the session for the TUI
async fn sign_in_command(mut config: Config) -> Result<()> {
    println!("\n=== Marketbook Sign In ===\n");

    let email = match std::env::var(EMAIL_ENV) {
        Ok(email) => email,
        Err(_) => prompt_email(config.last_email.as_deref())?,
    };

    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) if CredentialStore::has_credentials(&email) => {
            print!("Use stored password? [Y/n]: ");
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if input.trim().to_lowercase() != "n" {
                CredentialStore::get_password(&email)?
            } else {
                rpassword::prompt_password("Password: ")?
            }
        }
        Err(_) => rpassword::prompt_password("Password: ")?,
    };

    let form = SignInForm {
        email: email.trim().to_string(),
        password,
    };
    form.validate()?;

    let session = session_manager(&config)?;
    println!("\nSigning in...");
    match session.sign_in(&form.email, &form.password).await {
        Ok(seller) => {
            if let Err(e) = CredentialStore::store(&form.email, &form.password) {
                warn!(error = %e, "Failed to store credentials");
            }
            config.last_email = Some(form.email);
            config.save()?;
            println!("{}\n", seller.greeting());
            Ok(())
        }
        Err(e) => bail!(user_message(&e, SIGN_IN_FALLBACK)),
    }
}

async fn sign_out_command(config: &Config) -> Result<()> {
    let session = session_manager(config)?;
    if !session.restore_session().await {
        println!("Not signed in.");
        return Ok(());
    }
    let email = session.current_seller().await.map(|seller| seller.email);
    session.sign_out().await;
    if let Some(email) = email {
        if let Err(e) = CredentialStore::delete(&email) {
            warn!(error = %e, "Failed to forget stored credentials");
        }
    }
    println!("Signed out.");
    Ok(())
}

async fn whoami_command(config: &Config) -> Result<()> {
    let session = session_manager(config)?;
    session.restore_session().await;

    match session.current_seller().await {
        Some(seller) => {
            println!("{} <{}>", seller.name, seller.email);
            println!("Phone: {}", seller.phone_display());
            println!("API:   {}", session.api().base_url());
        }
        None => println!("Not signed in."),
    }
    Ok(())
}
