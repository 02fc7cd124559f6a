//! Terminal UI for eco: account screens plus a map of recycling points with walking routes.

mod app;
mod config;
mod input;
mod platform;
mod ui;

use std::{
    fs::OpenOptions,
    io,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use anyhow::{Context as _, Result};
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::{Client, ClientBuilder, redirect::Policy};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

use eco_core::{
    account::{AccountError, AccountOutcome, AccountService},
    diagnostics::{Diagnostic, Diagnostics},
    geolocation::GeolocationProvider,
    service::{MapEvent, MapOrchestrator},
};
use eco_provider_openroute::OpenRouteClient;

use crate::app::{App, RecyclerInput, RegisterInput, Screen};
use crate::config::Config;
use crate::input::Action;
use crate::platform::{ConfiguredLocation, FileSessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(&config.state_dir)?;
    tracing::info!(backend = %config.backend_url, routing = %config.routing_url, "starting eco");

    // HTTP + service setup
    let backend_client = http_client(&config)
        .redirect(Policy::none())
        .build()?;
    let routing_client = http_client(&config).build()?;

    let backend_ports = eco_provider_backend::ports(backend_client, &config.backend_url);
    let routing = Arc::new(OpenRouteClient::new(
        routing_client,
        config.routing_url.as_str(),
        config.routing_api_key.as_str(),
    ));
    let geolocation = Arc::new(GeolocationProvider::new(Arc::new(ConfiguredLocation::new(
        config.location.clone(),
    ))));
    let diagnostics = Diagnostics::new();
    let diagnostic_rx = diagnostics.subscribe();

    let orchestrator = Arc::new(MapOrchestrator::new(
        backend_ports.recycling,
        routing,
        geolocation,
        diagnostics,
    ));
    let session = Arc::new(FileSessionStore::open(&config.state_dir));
    let accounts = Arc::new(AccountService::new(backend_ports.account, session));

    // App state
    let app = App::new(accounts, orchestrator);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app, diagnostic_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    tracing::info!("eco stopped");
    res
}

fn http_client(config: &Config) -> ClientBuilder {
    let builder = Client::builder().user_agent("eco/0.1");
    match config.http_timeout {
        Some(timeout) => builder.timeout(timeout),
        None => builder,
    }
}

// Log to a file: stdout belongs to the terminal UI.
fn init_logging(state_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(state_dir)
        .with_context(|| format!("creating state directory {}", state_dir.display()))?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(state_dir.join("eco.log"))
        .context("opening log file")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    mut diagnostics: broadcast::Receiver<Diagnostic>,
) -> Result<()> {
    // Background map work reports back here; only this loop touches `app.map`.
    let (map_tx, mut map_rx) = mpsc::unbounded_channel::<MapEvent>();

    loop {
        while let Ok(event) = map_rx.try_recv() {
            if matches!(event, MapEvent::Points(_)) {
                app.last_refresh = Some(Local::now());
            }
            app.map.apply(event);
            app.clamp_marker_index();
            app.is_loading = false;
        }
        loop {
            match diagnostics.try_recv() {
                Ok(diagnostic) => app.last_diagnostic = Some(diagnostic),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "diagnostics lagged");
                }
                Err(_empty_or_closed) => break,
            }
        }

        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);

            match action {
                Action::Quit => break,
                Action::None => {}
                Action::RefreshMap => {
                    app.clear_messages();
                    app.is_loading = true;
                    app.orchestrator.spawn_refresh(map_tx.clone());
                }
                Action::Navigate(destination) => {
                    app.clear_messages();
                    app.is_loading = true;
                    app.map.close_info_window();
                    app.orchestrator.spawn_navigate(destination, map_tx.clone());
                }
                Action::Login => {
                    let (username, password) = app.login.credentials();
                    begin_request(terminal, &mut app)?;
                    let res = app.accounts.login(&username, &password).await;
                    finish_request(&mut app, res, "Credentials accepted", "Invalid credentials", |app| {
                        app.login.password.clear();
                        app.go_to(Screen::Main);
                    });
                }
                Action::Register => {
                    begin_request(terminal, &mut app)?;
                    let res = app.accounts.register(&app.register.form).await;
                    finish_request(
                        &mut app,
                        res,
                        "User registered, you can log in now",
                        "Could not register the user",
                        |app| {
                            app.register = RegisterInput::default();
                            app.go_to(Screen::Login);
                        },
                    );
                }
                Action::Logout => {
                    begin_request(terminal, &mut app)?;
                    let res = app.accounts.logout().await;
                    finish_request(&mut app, res, "Session closed", "Could not log out", |app| {
                        app.go_to(Screen::Login);
                    });
                }
                Action::SubmitRecycling => {
                    let selection = app.recycler.selection;
                    begin_request(terminal, &mut app)?;
                    let res = app.accounts.submit_recycling(selection).await;
                    finish_request(&mut app, res, "Data sent", "Error sending data", |app| {
                        app.recycler = RecyclerInput::default();
                        app.go_to(Screen::Main);
                    });
                }
                Action::CheckStatus => {
                    begin_request(terminal, &mut app)?;
                    let res = app.accounts.status().await;
                    app.is_loading = false;
                    match res {
                        Ok(body) => app.info_message = Some(format!("Backend: {}", body.trim())),
                        Err(err) => app.error_message = Some(format!("Status check failed: {err}")),
                    }
                }
            }
        }
    }

    Ok(())
}

fn begin_request(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    app.clear_messages();
    app.is_loading = true;
    terminal.draw(|frame| ui::draw(frame, app))?;
    Ok(())
}

fn finish_request(
    app: &mut App,
    res: Result<AccountOutcome, AccountError>,
    accepted: &str,
    rejected: &str,
    on_accept: impl FnOnce(&mut App),
) {
    app.is_loading = false;
    match res {
        Ok(AccountOutcome::Accepted) => {
            app.info_message = Some(accepted.to_owned());
            on_accept(app);
        }
        Ok(AccountOutcome::Rejected(body)) => {
            tracing::info!(body = %body.trim(), "backend rejected request");
            app.error_message = Some(rejected.to_owned());
        }
        Err(err) => {
            app.error_message = Some(err.to_string());
        }
    }
}
