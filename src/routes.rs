use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/appointments/available",
            get(handlers::appointments::available_slots),
        )
        .route(
            "/api/appointments/initiate",
            post(handlers::appointments::initiate),
        )
        .route(
            "/api/appointments/confirm",
            post(handlers::appointments::confirm),
        )
        .route(
            "/api/appointments/:id",
            get(handlers::appointments::get_appointment),
        )
        .route(
            "/api/appointments/:id/cancel",
            put(handlers::appointments::cancel_appointment),
        )
        .route(
            "/api/appointments/:id/status",
            put(handlers::appointments::update_status),
        )
        .route(
            "/api/appointments/:id/payment",
            put(handlers::appointments::update_payment),
        )
        .route(
            "/api/appointments/:id/calendar.ics",
            get(handlers::calendar::download_ics),
        )
        .route(
            "/api/reservations/:id/cancel",
            post(handlers::appointments::cancel_reservation),
        )
        .route("/api/packages", post(handlers::packages::create_package))
        .route("/api/packages/:id", get(handlers::packages::get_package))
        .route(
            "/api/payment/sandbox",
            post(handlers::payment::sandbox_payment),
        )
        .route(
            "/api/payment/verify/:transaction_id",
            get(handlers::payment::verify_payment),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
