use thiserror::Error;

/// A delivery-day fragment could not be turned into a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no \"<day>. <month>\" at the end of {fragment:?}")]
    NoMatch { fragment: String },
    #[error("unknown month name {month:?}")]
    UnknownMonth { month: String },
    #[error("invalid day of month {day:?}")]
    InvalidDay { day: String },
    #[error("{year}-{month:02}-{day:02} is not a calendar date")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

/// Why a schedule could not be fetched.
///
/// Never returned from [`crate::DeliveryClient::fetch`], which degrades to an empty schedule.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned an unreadable delivery day: {0}")]
    Parse(#[from] ParseError),
}
