mod client;
mod config;
mod notify;
mod poller;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::{SchedulerClient, DEFAULT_BASE_URL};
use crate::config::CheckWindow;
use crate::notify::TerminalBell;
use crate::poller::{AvailabilityPoller, PollOutcome};

#[derive(Parser)]
#[command(name = "slot-poller")]
#[command(about = "Checks the appointment scheduler for available slots in a date window")]
struct Args {
    /// Start date in YYYY-MM-DD format (default: tomorrow)
    #[arg(short, long)]
    start: Option<NaiveDate>,

    /// End date in YYYY-MM-DD format (default: start + 7 days)
    #[arg(short, long)]
    end: Option<NaiveDate>,

    /// The interval of checking the availability in seconds
    #[arg(short, long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// The location id
    #[arg(short, long, default_value_t = 5020)] // Blaine, WA
    location: u32,

    /// Scheduler API base URL
    #[arg(short = 'u', long, default_value = DEFAULT_BASE_URL, env = "SCHEDULER_API_URL")]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slot_poller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let window = match CheckWindow::resolve(args.start, args.end, Local::now().date_naive()) {
        Ok(window) => window,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Checking availability from {} to {} at location {}...",
        window.start(),
        window.end(),
        args.location
    );

    let client = SchedulerClient::new(args.base_url, args.location)
        .context("Failed to build scheduler client")?;
    let poller = AvailabilityPoller::new(client, TerminalBell, Duration::from_secs(args.interval));

    // Ctrl-C cancels the token instead of tearing the process down, so the
    // poll loop can exit cleanly mid-sleep.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, stopping...");
                cancel.cancel();
            }
        });
    }

    match poller.run(&window, &cancel).await {
        PollOutcome::Found(slots) => {
            tracing::info!("Found {} available slot(s), done", slots.len());
        }
        PollOutcome::Cancelled => {
            tracing::info!("Stopped before any slot opened up");
        }
    }

    Ok(())
}
