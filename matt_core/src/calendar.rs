//! Renders a schedule as an iCalendar document.

use std::{collections::HashMap, fmt, sync::Arc};

use chrono::NaiveDate;
use ical::{
    generator::{Emitter, IcalCalendarBuilder, IcalEvent, IcalEventBuilder, Property},
    ical_property,
};

use crate::config::CalendarConfig;

static FORMAT: &str = "%Y%m%d";
static STAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// A fully rendered calendar, served byte for byte.
///
/// Clones share the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDocument(Arc<str>);

impl CalendarDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CalendarDocument {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl fmt::Display for CalendarDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render one all-day event per date, in schedule order.
///
/// Repeated dates are rendered as separate events. The output only depends on the arguments.
pub fn render(schedule: &[NaiveDate], config: &CalendarConfig) -> CalendarDocument {
    let mut calendar = IcalCalendarBuilder::version("2.0")
        .gregorian()
        .prodid(prod_id(config))
        .build();
    calendar
        .properties
        .push(ical_property!("X-WR-CALNAME", escape_text(&config.name)));
    calendar
        .properties
        .push(ical_property!("X-WR-TIMEZONE", &config.timezone));
    let mut occurrences: HashMap<NaiveDate, usize> = HashMap::new();
    for date in schedule {
        let occurrence = occurrences.entry(*date).or_insert(0);
        *occurrence += 1;
        calendar.events.push(get_event(date, *occurrence, config));
    }
    let generated = calendar.generate();
    let body = generated.trim_end_matches(|c: char| c == '\r' || c == '\n');
    CalendarDocument::from(format!("{body}\n"))
}

/// Build the all-day event of a single delivery day.
fn get_event(date: &NaiveDate, occurrence: usize, config: &CalendarConfig) -> IcalEvent {
    let stamp = date
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.format(STAMP_FORMAT).to_string())
        .unwrap_or_default();
    IcalEventBuilder::tzid(&config.timezone)
        .uid(uid(date, occurrence, &config.domain))
        .changed(stamp)
        .one_day(date.format(FORMAT).to_string())
        .set(ical_property!("SUMMARY", escape_text(&config.summary)))
        .set(ical_property!("TRANSP", "TRANSPARENT"))
        .build()
}

/// Escape a TEXT property value as RFC 5545 requires.
fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

fn prod_id(config: &CalendarConfig) -> String {
    ["-", config.company.as_str(), config.product.as_str(), "EN"].join("//")
}

/// Get a unique id for the `occurrence`-th event on `date`.
///
/// Changing this function is a breaking change!
fn uid(date: &NaiveDate, occurrence: usize, domain: &str) -> String {
    let date = date.format(FORMAT);
    match occurrence {
        0 | 1 => format!("{date}@{domain}"),
        n => format!("{date}-{n}@{domain}"),
    }
}
