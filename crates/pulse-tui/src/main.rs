use anyhow::Result;
use pulse_core::{config, Config};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod markup;
mod palette;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

/// Environment variable holding the log filter, e.g. `PULSE_LOG=debug`.
const LOG_ENV: &str = "PULSE_LOG";

/// Logs go to a file; anything written to the terminal would corrupt the UI.
fn init_logging() -> Result<()> {
    let log_dir = config::config_dir()?;
    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("pulse.log"))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = init_logging() {
        eprintln!("logging disabled: {e}");
    }
    tracing::info!("Starting PulseAI v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("failed to load config, using defaults: {e:#}");
        Config::default()
    });

    let mut app = App::new(&config)?;
    app.client.start().await;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut app, &mut terminal).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!("exited with error: {e:#}");
    }
    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui) -> Result<()> {
    let mut events = EventHandler::new(tui::TICK_RATE);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event).await?;
    }

    // Drop any reply still in flight
    app.client.cancel_send();
    Ok(())
}
