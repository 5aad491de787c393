use axum::{
    extract::{Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        Method, StatusCode,
    },
    response::{IntoResponse, Response},
};
use matt_core::CalendarService;

/// Served for every path without a valid postal code. It yields an empty calendar.
static FALLBACK_POST_CODE: &str = "0";

pub async fn handle(calendar_service: &CalendarService, post_code: &str) -> Response {
    let calendar = calendar_service.calendar(post_code).await;
    (
        [
            (CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"calendar.ics\""),
        ],
        calendar.to_string(),
    )
        .into_response()
}

/// Handle calendar requests.
///
/// The postal code must be the only path segment and consist of four digits.
pub async fn handler(
    State(calendar_service): State<CalendarService>,
    Path(post_code): Path<String>,
) -> Response {
    let post_code = if is_post_code(&post_code) {
        post_code.as_str()
    } else {
        FALLBACK_POST_CODE
    };
    handle(&calendar_service, post_code).await
}

/// Serve the fallback calendar for any other `GET` or `HEAD` request.
pub async fn fallback(State(calendar_service): State<CalendarService>, method: Method) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return not_found().await;
    }
    handle(&calendar_service, FALLBACK_POST_CODE).await
}

pub async fn not_found() -> Response {
    StatusCode::NOT_FOUND.into_response()
}

fn is_post_code(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::Body,
        http::{
            header::{CONTENT_DISPOSITION, CONTENT_TYPE},
            Method, Request, StatusCode,
        },
        Router,
    };
    use matt_core::{
        CalendarConfig, CalendarService, DeliveryClient, ScheduleCache, UpstreamConfig,
    };
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::{
        matchers::{method, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::is_post_code;
    use crate::route::router;

    fn app(mock_server: &MockServer, api_timeout: u64) -> Router {
        let client = DeliveryClient::new(&UpstreamConfig {
            api_url: mock_server.uri(),
            api_timeout,
        });
        let cache = Arc::new(ScheduleCache::new(Duration::from_secs(600)));
        router(CalendarService::new(client, cache, CalendarConfig::default()))
    }

    async fn mock_post_code(mock_server: &MockServer, post_code: &str, days: &[&str]) {
        Mock::given(method("GET"))
            .and(query_param("postCode", post_code))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "nextDeliveryDays": days })),
            )
            .expect(1)
            .mount(mock_server)
            .await;
    }

    async fn send(app: Router, request_method: Method, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(request_method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_is_post_code() {
        assert!(is_post_code("0150"));
        assert!(is_post_code("9990"));
        assert!(!is_post_code("150"));
        assert!(!is_post_code("01500"));
        assert!(!is_post_code("01a0"));
        assert!(!is_post_code("٠١٥٠"));
    }

    #[tokio::test]
    async fn test_calendar_headers() {
        let mock_server = MockServer::start().await;
        mock_post_code(&mock_server, "0150", &["mandag 3. juni", "onsdag 5. juni"]).await;
        let request = Request::builder()
            .uri("/0150")
            .body(Body::empty())
            .unwrap();
        let response = app(&mock_server, 3000).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/calendar; charset=utf-8"
        );
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"calendar.ics\""
        );
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(body.matches("BEGIN:VEVENT").count(), 2);
    }

    #[tokio::test]
    async fn test_calendar_is_cached() {
        let mock_server = MockServer::start().await;
        mock_post_code(&mock_server, "0150", &["mandag 3. juni"]).await;
        let app = app(&mock_server, 3000);
        let (_, first) = send(app.clone(), Method::GET, "/0150").await;
        let (_, second) = send(app, Method::GET, "/0150").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invalid_post_code_falls_back() {
        let mock_server = MockServer::start().await;
        mock_post_code(&mock_server, "0", &[]).await;
        let app = app(&mock_server, 3000);
        for uri in ["/12345", "/abcd", "/", "/some/other/path"] {
            let (status, body) = send(app.clone(), Method::GET, uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert!(body.contains("BEGIN:VCALENDAR"), "{uri}");
            assert!(!body.contains("BEGIN:VEVENT"), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_other_methods_are_not_found() {
        let mock_server = MockServer::start().await;
        let app = app(&mock_server, 3000);
        let (status, _) = send(app.clone(), Method::POST, "/0150").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(app, Method::DELETE, "/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_head_is_served_on_every_path() {
        let mock_server = MockServer::start().await;
        mock_post_code(&mock_server, "0150", &["mandag 3. juni"]).await;
        mock_post_code(&mock_server, "0", &[]).await;
        let app = app(&mock_server, 3000);
        for uri in ["/0150", "/foo", "/", "/some/other/path"] {
            let (status, _) = send(app.clone(), Method::HEAD, uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_upstream_timeout_is_still_ok() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "nextDeliveryDays": ["mandag 3. juni"] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;
        let (status, body) = send(app(&mock_server, 50), Method::GET, "/0150").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("BEGIN:VCALENDAR"));
        assert!(!body.contains("BEGIN:VEVENT"));
    }
}
