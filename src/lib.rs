use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/re-auth", post(handlers::auth::re_auth))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route(
            "/api/bookings/court/:court_id",
            get(handlers::bookings::get_bookings_by_court),
        )
        .route(
            "/api/bookings/court/:court_id/range",
            get(handlers::bookings::get_bookings_by_range),
        )
        .route(
            "/api/bookings/:id",
            put(handlers::bookings::update_booking).delete(handlers::bookings::delete_booking),
        )
        .route(
            "/api/bookings/:id/permanent",
            put(handlers::bookings::set_permanence),
        )
        .route(
            "/api/clients",
            post(handlers::clients::create_client).get(handlers::clients::get_clients),
        )
        .route("/api/clients/:id/stats", get(handlers::clients::get_client_stats))
        .route(
            "/api/clients/:id/bookings",
            get(handlers::clients::get_client_bookings),
        )
        .route(
            "/api/clients/:id",
            put(handlers::clients::update_client).delete(handlers::clients::delete_client),
        )
        .route(
            "/api/courts",
            post(handlers::courts::create_court).get(handlers::courts::get_courts),
        )
        .route("/api/courts/originals", get(handlers::courts::get_original_courts))
        .route(
            "/api/courts/:id",
            put(handlers::courts::update_court).delete(handlers::courts::delete_court),
        )
        .route(
            "/api/users",
            post(handlers::users::create_user).get(handlers::users::get_users),
        )
        .route(
            "/api/users/:id",
            put(handlers::users::update_user).delete(handlers::users::delete_user),
        )
        .route("/api/logs", get(handlers::logs::get_logs))
        .route("/api/stats/clients", get(handlers::stats::client_stats))
        .route("/api/stats/financial", get(handlers::stats::financial_stats))
        .route("/api/stats/clients/export", get(handlers::stats::export_clients))
        .route(
            "/api/stats/financial/export",
            get(handlers::stats::export_financial),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
