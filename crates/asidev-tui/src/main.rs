use anyhow::Result;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use asidev_core::Config;

/// File-only logging; stdout or stderr output would corrupt the alternate
/// screen. Level comes from `ASIDEV_LOG`, defaulting to `info`.
fn init_logging() {
    let Ok(log_dir) = Config::config_dir() else {
        return;
    };

    let appender = tracing_appender::rolling::daily(log_dir, "asidev.log");
    let filter = tracing_subscriber::EnvFilter::try_from_env("ASIDEV_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(appender)
        .with_ansi(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("failed to load config, using defaults: {e}");
        Config::new()
    });

    let mut app = App::new(config)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut app, &mut terminal, &mut events).await;

    tui::restore()?;
    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui, events: &mut tui::EventHandler) -> Result<()> {
    let tx = events.sender();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event, &tx)?,
            None => break,
        }
    }

    Ok(())
}
