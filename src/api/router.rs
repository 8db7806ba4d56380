use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{auth, finance, health, order, patient, profile, public, settings};
use crate::domain::models::order::MAX_RESULT_FILE_SIZE;
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

/// Room for multipart framing around a maximum-size result file.
const UPLOAD_BODY_LIMIT: usize = MAX_RESULT_FILE_SIZE + 2 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))

        // Profile & users
        .route("/api/v1/me", get(profile::get_me).put(profile::update_me))
        .route("/api/v1/users/{user_id}/finance-access", put(profile::set_finance_access))

        // Overview
        .route("/api/v1/dashboard", get(finance::dashboard))
        .route("/api/v1/finance", get(finance::finance_report))

        // Patients
        .route("/api/v1/patients", get(patient::list_patients))
        .route("/api/v1/patients/{patient_id}", get(patient::get_patient))

        // Orders
        .route("/api/v1/orders", post(order::create_order).get(order::list_orders))
        .route("/api/v1/orders/{order_id}", get(order::get_order).delete(order::delete_order))
        .route(
            "/api/v1/orders/{order_id}/result",
            post(order::upload_result).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/v1/orders/{order_id}/approve", post(order::approve_order))
        .route("/api/v1/orders/{order_id}/republish", post(order::republish_order))
        .route("/api/v1/orders/{order_id}/lock", put(order::lock_order))

        // Settings
        .route("/api/v1/settings", get(settings::get_settings).put(settings::update_settings))
        .route("/api/v1/settings/public", get(settings::get_public_settings))

        // Public result lookup
        .route("/api/v1/public/check", post(public::check_result))
        .route("/results_files/{file_name}", get(public::serve_result_file))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
