//! Option groups shared by the server and the CLI.
//!
//! Every option can be given as a flag or through its `MATT_*` environment variable, and every
//! option has a default.

use std::time::Duration;

use chrono::{Local, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::Args;
use tracing::warn;

pub static DEFAULT_API_URL: &str =
    "https://www.posten.no/levering-av-post/_/component/main/1/leftRegion/1";
pub const DEFAULT_API_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;
pub const DEFAULT_CACHE_CHECKPERIOD_SECS: u64 = 600;
pub static DEFAULT_DOMAIN: &str = "example.com";
pub static DEFAULT_COMPANY: &str = "Acme Inc.";
pub static DEFAULT_PRODUCT: &str = "Example Product";
pub static DEFAULT_NAME: &str = "Matt";
pub static DEFAULT_TIMEZONE: &str = "Europe/Oslo";
pub static DEFAULT_SUMMARY: &str = "POST";

#[derive(Debug, Clone, Args)]
pub struct UpstreamConfig {
    /// the delivery day endpoint, queried with `postCode`
    #[arg(long, env = "MATT_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
    /// the upstream timeout in milliseconds
    #[arg(long, env = "MATT_API_TIMEOUT", default_value_t = DEFAULT_API_TIMEOUT_MS)]
    pub api_timeout: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: String::from(DEFAULT_API_URL),
            api_timeout: DEFAULT_API_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct CacheConfig {
    /// how long a rendered calendar is served from memory, in seconds
    #[arg(long, env = "MATT_CACHE_TTL", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl: u64,
    /// how often expired calendars are swept from memory, in seconds (0 disables the sweep)
    #[arg(
        long,
        env = "MATT_CACHE_CHECKPERIOD",
        default_value_t = DEFAULT_CACHE_CHECKPERIOD_SECS
    )]
    pub cache_checkperiod: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn check_period(&self) -> Option<Duration> {
        (self.cache_checkperiod > 0).then(|| Duration::from_secs(self.cache_checkperiod))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL_SECS,
            cache_checkperiod: DEFAULT_CACHE_CHECKPERIOD_SECS,
        }
    }
}

/// Metadata written into the calendar. None of it affects which dates are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct CalendarConfig {
    /// the organization domain used in event UIDs
    #[arg(long, env = "MATT_DOMAIN", default_value = DEFAULT_DOMAIN)]
    pub domain: String,
    /// the company part of the PRODID
    #[arg(long, env = "MATT_COMPANY", default_value = DEFAULT_COMPANY)]
    pub company: String,
    /// the product part of the PRODID
    #[arg(long, env = "MATT_PRODUCT", default_value = DEFAULT_PRODUCT)]
    pub product: String,
    /// the calendar name shown by clients
    #[arg(long, env = "MATT_NAME", default_value = DEFAULT_NAME)]
    pub name: String,
    /// the IANA timezone of the calendar and of "today"
    #[arg(long, env = "MATT_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,
    /// the summary of every delivery day event
    #[arg(long, env = "MATT_SUMMARY", default_value = DEFAULT_SUMMARY)]
    pub summary: String,
}

impl CalendarConfig {
    /// The current date in the calendar's timezone.
    ///
    /// Falls back to the local date if the timezone is unknown.
    pub fn today(&self) -> NaiveDate {
        match self.timezone.parse::<Tz>() {
            Ok(timezone) => Utc::now().with_timezone(&timezone).date_naive(),
            Err(err) => {
                warn!(timezone = %self.timezone, error = %err, "unknown timezone, using local date");
                Local::now().date_naive()
            }
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            domain: String::from(DEFAULT_DOMAIN),
            company: String::from(DEFAULT_COMPANY),
            product: String::from(DEFAULT_PRODUCT),
            name: String::from(DEFAULT_NAME),
            timezone: String::from(DEFAULT_TIMEZONE),
            summary: String::from(DEFAULT_SUMMARY),
        }
    }
}
