//! This crate serves Posten's next delivery days for a postal code as an iCalendar file.
//!
//! The path is `/<post_code>` with a four digit postal code. Any other `GET` path is served the
//! (empty) calendar of postal code `0`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use clap::Parser;
use matt_core::{
    CacheConfig, CalendarConfig, CalendarService, DeliveryClient, ScheduleCache, UpstreamConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod route;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Arguments {
    /// the port to listen on
    #[arg(long, env = "MATT_PORT", default_value_t = 3000)]
    port: u16,
    #[command(flatten)]
    upstream: UpstreamConfig,
    #[command(flatten)]
    cache: CacheConfig,
    #[command(flatten)]
    calendar: CalendarConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Arguments::parse();
    let cache = Arc::new(ScheduleCache::new(args.cache.ttl()));
    if let Some(period) = args.cache.check_period() {
        cache.spawn_sweeper(period);
    }
    let calendar_service =
        CalendarService::new(DeliveryClient::new(&args.upstream), cache, args.calendar);
    let app = route::router(calendar_service);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("listening at http://{addr}");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
