//! This crate turns Posten's "next delivery days" listing for a postal code into an iCalendar
//! document with one all-day event per delivery day.
//!
//! The dates are read from the delivery-day component of <https://www.posten.no/levering-av-post>.
//! They come without a year, so the year is inferred relative to "today".

pub use ical;

pub mod cache;
pub mod calendar;
pub mod config;
pub mod date;
pub mod delivery_client;
pub mod error;
pub mod service;

pub use cache::{Clock, ScheduleCache, SystemClock};
pub use calendar::{render, CalendarDocument};
pub use config::{CacheConfig, CalendarConfig, UpstreamConfig};
pub use date::{normalize, MonthTable};
pub use delivery_client::{DeliveryClient, Schedule};
pub use error::{FetchError, ParseError};
pub use service::CalendarService;
