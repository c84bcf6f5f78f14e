use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use mathtutor_core::{logging, Config, SolverClient};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "mathtutor")]
#[command(about = "Ask a math tutoring service questions from the terminal")]
#[command(version)]
struct Cli {
    /// Base URL of the solving service
    #[arg(long)]
    api_url: Option<String>,
    /// User id sent with every question
    #[arg(long)]
    user_id: Option<String>,
    /// Write the effective settings to the config file and exit
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(user) = cli.user_id {
        config.user_id = user;
    }

    if cli.save_config {
        let path = config.save()?;
        println!("Saved settings to {}", path.display());
        return Ok(());
    }

    // Logging is best effort; the client works without it
    let _log_guard = logging::default_log_dir()
        .and_then(|dir| logging::init_logging(&dir))
        .map_err(|e| eprintln!("Logging disabled: {}", e))
        .ok();

    tracing::info!(api_url = %config.api_url, user_id = %config.user_id, "starting");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &config).await;

    tui::restore()?;
    tracing::info!("exiting");
    result
}

async fn run(terminal: &mut tui::Tui, config: &Config) -> Result<()> {
    let mut events = EventHandler::new();
    let client = Arc::new(SolverClient::new(&config.api_url));
    let mut app = App::new(client, &config.user_id, &config.api_url, events.sender());

    app.probe_status();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }
    }

    Ok(())
}
