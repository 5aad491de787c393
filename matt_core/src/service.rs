//! The cache-fronted path from a postal code to a calendar.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::{
    cache::{Clock, ScheduleCache, SystemClock},
    calendar::{render, CalendarDocument},
    config::CalendarConfig,
    delivery_client::DeliveryClient,
};

#[derive(Debug)]
pub struct CalendarService<C = SystemClock> {
    client: DeliveryClient,
    cache: Arc<ScheduleCache<C>>,
    calendar_config: Arc<CalendarConfig>,
}

impl<C> Clone for CalendarService<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            cache: Arc::clone(&self.cache),
            calendar_config: Arc::clone(&self.calendar_config),
        }
    }
}

impl<C: Clock> CalendarService<C> {
    pub fn new(
        client: DeliveryClient,
        cache: Arc<ScheduleCache<C>>,
        calendar_config: CalendarConfig,
    ) -> Self {
        Self {
            client,
            cache,
            calendar_config: Arc::new(calendar_config),
        }
    }

    pub fn cache(&self) -> &Arc<ScheduleCache<C>> {
        &self.cache
    }

    /// Get the calendar for a postal code, fetching it if it is not cached.
    ///
    /// This never fails: upstream trouble yields a calendar without events.
    pub async fn calendar(&self, post_code: &str) -> CalendarDocument {
        self.calendar_on(post_code, self.calendar_config.today())
            .await
    }

    /// Like [`CalendarService::calendar`], with an explicit "today" for the year rollover.
    pub async fn calendar_on(&self, post_code: &str, today: NaiveDate) -> CalendarDocument {
        if let Some(document) = self.cache.get(post_code) {
            debug!(post_code, "calendar found in cache");
            return document;
        }
        debug!(post_code, "calendar not found in cache, fetching schedule");
        let schedule = self.client.fetch(post_code, today).await;
        let document = render(&schedule, &self.calendar_config);
        self.cache.insert(post_code, document.clone());
        document
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{BufReader, Cursor},
        sync::{Arc, Mutex},
        time::{Duration, Instant},
    };

    use chrono::NaiveDate;
    use ical::IcalParser;
    use serde_json::json;
    use wiremock::{
        matchers::{method, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use crate::{
        cache::{Clock, ScheduleCache},
        calendar::CalendarDocument,
        config::{CalendarConfig, UpstreamConfig},
        delivery_client::DeliveryClient,
        service::CalendarService,
    };

    struct ManualClock(Mutex<Instant>);

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.0.lock().unwrap()
        }
    }

    fn service<C: Clock>(
        mock_server: &MockServer,
        api_timeout: u64,
        cache: ScheduleCache<C>,
    ) -> CalendarService<C> {
        let client = DeliveryClient::new(&UpstreamConfig {
            api_url: mock_server.uri(),
            api_timeout,
        });
        CalendarService::new(client, Arc::new(cache), CalendarConfig::default())
    }

    fn dtstarts(document: &CalendarDocument) -> Vec<String> {
        let mut parser =
            IcalParser::new(BufReader::new(Cursor::new(document.as_str().trim_end())));
        let calendar = parser.next().unwrap().unwrap();
        calendar
            .events
            .iter()
            .filter_map(|event| {
                event
                    .properties
                    .iter()
                    .find(|property| property.name == "DTSTART")
                    .and_then(|property| property.value.clone())
            })
            .collect()
    }

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn test_calendar_end_to_end() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("postCode", "0150"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "nextDeliveryDays": ["mandag 3. juni"] })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        let calendar_service = service(
            &mock_server,
            3000,
            ScheduleCache::new(Duration::from_secs(600)),
        );
        let document = calendar_service.calendar_on("0150", june_first()).await;
        assert_eq!(dtstarts(&document), vec!["20240603"]);
        let cached = calendar_service.calendar_on("0150", june_first()).await;
        assert_eq!(cached, document);
    }

    #[tokio::test]
    async fn test_calendar_refetched_after_ttl() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "nextDeliveryDays": ["mandag 3. juni"] })),
            )
            .expect(2)
            .mount(&mock_server)
            .await;
        let clock = Arc::new(ManualClock(Mutex::new(Instant::now())));
        let cache = ScheduleCache::with_clock(Duration::from_secs(600), Arc::clone(&clock));
        let calendar_service = service(&mock_server, 3000, cache);
        calendar_service.calendar_on("0150", june_first()).await;
        calendar_service.calendar_on("0150", june_first()).await;
        *clock.0.lock().unwrap() += Duration::from_secs(600);
        calendar_service.calendar_on("0150", june_first()).await;
    }

    #[tokio::test]
    async fn test_calendar_upstream_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "nextDeliveryDays": ["mandag 3. juni"] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;
        let calendar_service = service(
            &mock_server,
            50,
            ScheduleCache::new(Duration::from_secs(600)),
        );
        let document = calendar_service.calendar_on("0150", june_first()).await;
        assert!(dtstarts(&document).is_empty());
        assert!(document.as_str().contains("BEGIN:VCALENDAR"));
        assert_eq!(calendar_service.cache().len(), 1);
    }
}
