mod app;
mod settings;
mod speedtest;
mod ui;

use anyhow::{Context, Result};
use app::{poll_event, App, AppAction};
use clap::Parser;
use crossterm::event::Event;
use ratatui::DefaultTerminal;
use settings::Settings;
use speedtest::session::{SessionState, SpeedTest, SpeedTestError};
use speedtest::transport::HttpTransport;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use ui::draw_ui;

#[derive(Parser)]
#[command(name = "speedgauge")]
#[command(about = "Measure latency, download and upload speed from the terminal")]
#[command(version)]
struct Cli {
    /// Run one test without the terminal UI and print the readings
    #[arg(long)]
    headless: bool,

    /// Endpoint timed for latency
    #[arg(long, env = "SPEEDGAUGE_PING_URL")]
    ping_url: Option<String>,

    /// Endpoint serving the download payload; `?bytes=<size>` is appended
    #[arg(long, env = "SPEEDGAUGE_DOWNLOAD_URL")]
    download_url: Option<String>,

    /// Endpoint accepting the upload payload
    #[arg(long, env = "SPEEDGAUGE_UPLOAD_URL")]
    upload_url: Option<String>,

    /// Write logs to this file (the UI otherwise runs without logs)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let settings = Settings::with_endpoints(cli.ping_url, cli.download_url, cli.upload_url);
    debug!(?settings, "loaded settings");

    let transport = HttpTransport::new().context("failed to build HTTP client")?;
    let test = Arc::new(SpeedTest::new(&settings, Arc::new(transport)));

    if cli.headless {
        return run_headless(test).await;
    }

    let mut terminal = ratatui::init();
    terminal.clear()?;

    let result = run_app(&mut terminal, test).await;

    ratatui::restore();
    result
}

fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "speedgauge=info".into());

    if let Some(path) = &cli.log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if cli.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

async fn run_headless(test: Arc<SpeedTest>) -> Result<()> {
    let mut updates = test.subscribe();
    let watcher = tokio::spawn(async move {
        let mut last = SessionState::default().phase;
        while let Some(state) = updates.recv().await {
            if state.phase != last {
                info!(phase = %state.phase, "phase changed");
                last = state.phase;
            }
        }
    });

    let state = test.run().await?;
    watcher.abort();

    println!("Ping: {} ms", state.ping_ms);
    println!("Download: {} Mbps", state.download_mbps);
    println!("Upload: {} Mbps", state.upload_mbps);
    Ok(())
}

async fn run_app(terminal: &mut DefaultTerminal, test: Arc<SpeedTest>) -> Result<()> {
    let mut app = App::new();
    let mut updates = test.subscribe();

    loop {
        terminal.draw(|frame| draw_ui(frame, &app))?;

        // Apply every snapshot published since the last frame
        while let Ok(state) = updates.try_recv() {
            app.apply(state);
        }

        if let Some(Event::Key(key)) = poll_event(Duration::from_millis(30))? {
            match app.handle_key_event(key) {
                Some(AppAction::Quit) => break,
                Some(AppAction::StartTest) if test.is_running() => {
                    debug!("start ignored, test already running");
                }
                Some(AppAction::StartTest) => {
                    let test = Arc::clone(&test);
                    tokio::spawn(async move {
                        if let Err(SpeedTestError::AlreadyRunning) = test.run().await {
                            debug!("ignored start request, test already running");
                        }
                    });
                }
                None => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
