//! Turns year-less delivery-day fragments such as `"tirsdag 4. juni"` into calendar dates.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::debug;

use crate::error::ParseError;

static NORWEGIAN_MONTHS: [&str; 12] = [
    "januar",
    "februar",
    "mars",
    "april",
    "mai",
    "juni",
    "juli",
    "august",
    "september",
    "oktober",
    "november",
    "desember",
];

/// Lookup from full month names to month numbers (1-based).
///
/// Names are matched exactly, so the table must use the case the upstream service uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthTable {
    names: [String; 12],
}

impl MonthTable {
    pub fn new(names: [&str; 12]) -> Self {
        Self {
            names: names.map(String::from),
        }
    }

    /// The month names used by posten.no.
    pub fn norwegian() -> Self {
        Self::new(NORWEGIAN_MONTHS)
    }

    pub fn month(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| index as u32 + 1)
    }
}

impl Default for MonthTable {
    fn default() -> Self {
        Self::norwegian()
    }
}

fn fragment_regex() -> &'static Regex {
    static FRAGMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    FRAGMENT_REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)
                (?P<day>\d+) # the day
                \.\s+
                (?P<month>\w+) # the full month name
                $ # anything before, e.g. the weekday, is ignored
            ",
        )
        .unwrap()
    })
}

/// Resolve a fragment ending in `"<day>. <month>"` to a date which is not before `today`.
///
/// The date is first placed in `today`'s year and moved one year ahead if that lies in the past.
/// A date equal to `today` stays where it is.
pub fn normalize(
    fragment: &str,
    today: NaiveDate,
    months: &MonthTable,
) -> Result<NaiveDate, ParseError> {
    let captures = fragment_regex()
        .captures(fragment)
        .ok_or_else(|| ParseError::NoMatch {
            fragment: fragment.to_string(),
        })?;
    let day = parse_day(&captures["day"])?;
    let month = months
        .month(&captures["month"])
        .ok_or_else(|| ParseError::UnknownMonth {
            month: captures["month"].to_string(),
        })?;
    let year = today.year();
    // 29 February only exists in the next year if this one is not a leap year.
    let candidate = match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => date_in(year + 1, month, day)?,
    };
    if candidate >= today {
        return Ok(candidate);
    }
    let rolled = date_in(candidate.year() + 1, month, day)?;
    debug!(fragment, date = %rolled, "year rollover");
    Ok(rolled)
}

fn parse_day(token: &str) -> Result<u32, ParseError> {
    match token.parse::<u32>() {
        Ok(day) if (1..=31).contains(&day) => Ok(day),
        _ => Err(ParseError::InvalidDay {
            day: token.to_string(),
        }),
    }
}

fn date_in(year: i32, month: u32, day: u32) -> Result<NaiveDate, ParseError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ParseError::InvalidDate { year, month, day })
}
