//! This client fetches the next delivery days for a postal code and parses them into a schedule.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Response,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    config::UpstreamConfig,
    date::{normalize, MonthTable},
    error::{FetchError, ParseError},
};

/// Delivery days in upstream order, duplicates included.
pub type Schedule = Vec<NaiveDate>;

/// The part of the upstream payload we use.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryDays {
    next_delivery_days: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    months: MonthTable,
}

impl DeliveryClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.api_url.clone(),
            timeout: config.timeout(),
            months: MonthTable::default(),
        }
    }

    /// Use another set of month names for parsing the delivery days.
    pub fn with_months(mut self, months: MonthTable) -> Self {
        self.months = months;
        self
    }

    /// Get the schedule for a postal code.
    ///
    /// Any failure, including a single unreadable delivery day, results in an empty schedule.
    pub async fn fetch(&self, post_code: &str, today: NaiveDate) -> Schedule {
        match self.try_fetch(post_code, today).await {
            Ok(schedule) => schedule,
            Err(err) => {
                warn!(
                    post_code,
                    error = %err,
                    "could not fetch delivery days, serving an empty schedule"
                );
                Schedule::new()
            }
        }
    }

    async fn try_fetch(&self, post_code: &str, today: NaiveDate) -> Result<Schedule, FetchError> {
        let response = self.get_response(post_code).await?;
        let delivery_days: DeliveryDays = response.json().await?;
        debug!(
            post_code,
            delivery_days = delivery_days.next_delivery_days.len(),
            "fetched delivery days"
        );
        let schedule = parse(&delivery_days.next_delivery_days, today, &self.months)?;
        Ok(schedule)
    }

    /// Get the delivery day response from the upstream server.
    async fn get_response(&self, post_code: &str) -> Result<Response, reqwest::Error> {
        self.client
            .get(&self.url)
            .query(&[("postCode", post_code)])
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header("x-requested-with", "XMLHttpRequest")
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()
    }
}

/// Normalize all fragments against the same `today`, failing on the first unreadable one.
fn parse(
    fragments: &[String],
    today: NaiveDate,
    months: &MonthTable,
) -> Result<Schedule, ParseError> {
    fragments
        .iter()
        .map(|fragment| normalize(fragment, today, months))
        .collect()
}
