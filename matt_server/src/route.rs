pub mod calendar;

use axum::{routing::get, Router};
use matt_core::CalendarService;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub fn router(calendar_service: CalendarService) -> Router {
    Router::new()
        .route(
            "/:post_code",
            get(calendar::handler).fallback(calendar::not_found),
        )
        .fallback(calendar::fallback)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(calendar_service)
}
