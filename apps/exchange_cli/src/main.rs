use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use exchange_core::{ExchangeEngine, ExchangeHandle, HttpGateway};
use shared::domain::{Direction, Participant};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod config;
mod controller;
mod ui;

use backend_bridge::commands::{parse_command, parse_direction, HELP_TEXT};
use config::{load_settings, prepare_service_url, Settings, DEFAULT_CONFIG_PATH};
use controller::{
    events::{UiError, UiErrorContext, UiEvent},
    orchestration::dispatch_command,
};
use ui::presenter::{render_exchange_event, spawn_presenter};

#[derive(Parser, Debug)]
#[command(name = "rsa-exchange", about = "Walk through an RSA exchange between Alice and Bob")]
struct Args {
    /// Path to the TOML config file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Base URL of the crypto service.
    #[arg(long)]
    service_url: Option<String>,
    /// Per-request transport timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long)]
    log_filter: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive console (default).
    Console,
    /// Send one message, decrypt it on the other side, and print the timeline.
    Demo {
        #[arg(long, value_parser = parse_direction, default_value = "alice-to-bob")]
        direction: Direction,
        #[arg(long)]
        message: String,
        /// Print the timeline as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn resolve_settings(args: &Args) -> Result<Settings> {
    let mut settings = load_settings(&args.config)?;
    if let Some(v) = &args.service_url {
        settings.service_url = v.clone();
    }
    if let Some(v) = args.timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = &args.log_filter {
        settings.log_filter = v.clone();
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = resolve_settings(&args)?;

    let filter = EnvFilter::try_new(&settings.log_filter)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let service_url = prepare_service_url(&settings.service_url)?;
    let gateway = match settings.request_timeout() {
        Some(timeout) => HttpGateway::with_timeout(&service_url, timeout)?,
        None => HttpGateway::new(&service_url),
    };
    info!(service_url = %gateway.base_url(), "using crypto service");
    let engine = ExchangeEngine::new(Arc::new(gateway));
    let handle: Arc<dyn ExchangeHandle> = engine;

    match args.command.unwrap_or(Command::Console) {
        Command::Console => run_console(handle).await,
        Command::Demo {
            direction,
            message,
            json,
        } => run_demo(handle, direction, &message, json).await,
    }
}

async fn run_console(handle: Arc<dyn ExchangeHandle>) -> Result<()> {
    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let presenter = spawn_presenter(ui_rx);
    let bridge = backend_bridge::runtime::launch(&handle, ui_tx.clone());

    let _ = ui_tx.send(UiEvent::Info(HELP_TEXT.to_string()));
    if let Err(err) = handle.initialize().await {
        error!(error = %err, "initialization failed");
        let _ = ui_tx.send(UiEvent::Error(UiError::from_exchange(
            UiErrorContext::Startup,
            &err,
        )));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read console input")? {
        match parse_command(&line) {
            Ok(Some(cmd)) => {
                if dispatch_command(&handle, cmd, &ui_tx).is_break() {
                    break;
                }
            }
            Ok(None) => {}
            Err(message) => {
                let _ = ui_tx.send(UiEvent::Info(message));
            }
        }
    }

    bridge.abort();
    drop(ui_tx);
    let _ = presenter.await;
    Ok(())
}

async fn run_demo(
    handle: Arc<dyn ExchangeHandle>,
    direction: Direction,
    message: &str,
    json: bool,
) -> Result<()> {
    let mut events = handle.subscribe_events();

    handle.initialize().await?;
    let receipt = match direction.sender() {
        Participant::Alice => handle.send_as_alice(message).await,
        Participant::Bob => handle.send_as_bob(message).await,
    }
    .with_context(|| format!("{direction}: send failed"))?;
    info!(run_id = %receipt.run_id, "demo: ciphertext delivered");
    let plaintext = match direction.recipient() {
        Participant::Alice => handle.decrypt_as_alice().await,
        Participant::Bob => handle.decrypt_as_bob().await,
    }
    .with_context(|| format!("{direction}: decrypt failed"))?;

    let snapshot = handle.snapshot().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.timeline)?);
    } else {
        while let Ok(event) = events.try_recv() {
            for line in render_exchange_event(&event) {
                println!("{line}");
            }
        }
    }

    if plaintext != message.trim() {
        bail!("{direction}: decrypted text does not match the original message");
    }
    Ok(())
}
