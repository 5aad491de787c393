use std::{env::current_dir, fs::write};

use anyhow::Result;
use clap::Parser;
use matt_core::{render, CalendarConfig, DeliveryClient, UpstreamConfig};
use tracing_subscriber::EnvFilter;

/// Write the next delivery days of a postal code to `calendar.ics` in the current directory.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Arguments {
    /// the four digit postal code
    pub post_code: String,
    #[command(flatten)]
    pub upstream: UpstreamConfig,
    #[command(flatten)]
    pub calendar: CalendarConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Arguments::parse();
    let schedule = DeliveryClient::new(&args.upstream)
        .fetch(&args.post_code, args.calendar.today())
        .await;
    let calendar = render(&schedule, &args.calendar);
    let mut path = current_dir()?;
    path.push("calendar.ics");
    write(path, calendar.as_str())?;
    Ok(())
}
