mod commands;
mod console;
mod interrupts;
mod updates;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use offerwatch_core::{
    AppConfig, FeedClient, FilterStore, Notifier, TelegramClient, TelegramSink, WatchManager,
};
use reqwest::ClientBuilder;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::run_control;

const STARTUP_MESSAGE: &str = "Bot has started successfully!";

#[derive(Debug, Parser)]
#[command(name = "offerwatch", about = "Watches housing offers by postal code")]
struct Cli {
    /// Configuration file (defaults to ~/.config/offerwatch/config.json)
    #[arg(short, long, env = "OFFERWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Read postal codes from stdin instead of Telegram commands
    #[arg(long)]
    console: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;
    let watch_config = config.watch_config();

    let client = ClientBuilder::new()
        .user_agent("OfferWatch/0.1")
        .build()?;
    let telegram = TelegramClient::new(
        client.clone(),
        &config.telegram.api_base,
        &config.telegram.bot_token,
    );
    let notifier = Notifier::new(
        Arc::new(TelegramSink::new(telegram.clone(), &config.telegram.chat_id)),
        watch_config.retry_backoff,
    );
    let feed = FeedClient::new(client, &config.feed.endpoint)
        .with_min_rent(config.feed.min_rent)
        .with_timeout(config.request_timeout());
    let store = FilterStore::new(config.filters_path());
    let mut manager = WatchManager::new(Arc::new(feed), notifier.clone(), store, watch_config);

    notifier.send_reliable(STARTUP_MESSAGE).await;
    match manager.resume().await {
        Ok(Some(_)) => {}
        Ok(None) => info!("no saved postal codes, waiting for a command"),
        Err(e) => warn!(error = %e, "failed to read saved postal codes"),
    }

    let (control_tx, control_rx) = mpsc::channel(16);
    let control = tokio::spawn(run_control(manager, control_rx));

    let interrupt_tx = control_tx.clone();
    let signals = interrupts::forward_ctrl_c();
    tokio::spawn(async move {
        if interrupts::watch_interrupts(signals, interrupt_tx).await {
            std::process::exit(130);
        }
    });

    let surface = if cli.console {
        tokio::spawn(console::run_console(control_tx))
    } else {
        tokio::spawn(updates::run_updates(
            telegram,
            control_tx,
            watch_config.retry_backoff,
        ))
    };

    control.await?;
    surface.abort();
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
