//! HTTP surface: route table, middleware and JSON handlers

pub mod auth;
pub mod categories;
pub mod expenses;
pub mod extract;
pub mod groups;
pub mod health;
pub mod invites;
pub mod notifications;
pub mod payments;
pub mod preferences;
pub mod reports;
pub mod upi;

use crate::auth::rate_limit::{login_rate_limit, signup_rate_limit};
use crate::config::AppConfig;
use crate::AppState;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Build the application router with every route and layer attached
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/auth", auth_routes(&state))
        .nest("/api/categories", category_routes())
        .nest("/api/payments", payment_routes())
        .nest("/api/groups", group_routes())
        .nest("/api/invites", invite_routes())
        .route("/api/expenses/{id}/remind", post(expenses::remind))
        .route("/api/expenses/{id}/settle", post(expenses::settle))
        .route(
            "/api/expense-splits/{id}/request-approval",
            post(expenses::request_approval),
        )
        .route("/api/expense-splits/{id}/approve", post(expenses::approve))
        .route("/api/expense-splits/{id}/reject", post(expenses::reject))
        .nest("/api/upi", upi_routes())
        .route(
            "/api/notifications",
            get(notifications::list).patch(notifications::mark_read),
        )
        .route(
            "/api/preferences",
            get(preferences::get).put(preferences::update),
        )
        .route("/api/reports/generate", post(reports::generate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let login_limited = Router::new()
        .route("/signin", post(auth::signin))
        .route("/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    let signup_limited = Router::new()
        .route("/signup", post(auth::signup))
        .route("/create", post(auth::create))
        .route_layer(middleware::from_fn_with_state(state.clone(), signup_rate_limit));

    Router::new()
        .merge(login_limited)
        .merge(signup_limited)
        .route("/complete-profile", post(auth::complete_profile))
        .route("/reset-pin", post(auth::reset_pin))
        .route("/user", get(auth::user))
        .route("/check-email", get(auth::check_email))
        .route("/check-username", get(auth::check_username))
        .route("/logout", post(auth::logout))
        .route("/google", get(auth::google))
        .route("/google/callback", get(auth::google_callback))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route("/{id}", put(categories::update).delete(categories::delete))
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(payments::list).post(payments::create))
        .route("/stats", get(payments::stats))
        .route("/{id}", put(payments::update).delete(payments::delete))
}

fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(groups::list).post(groups::create))
        .route(
            "/{id}",
            get(groups::get).patch(groups::update).delete(groups::delete),
        )
        .route("/{id}/members", get(groups::members))
        .route("/{id}/members/{user_id}", delete(groups::remove_member))
        .route("/{id}/invite", post(groups::invite))
        .route("/{id}/leave", post(groups::leave))
        .route(
            "/{id}/messages",
            get(groups::messages).post(groups::post_message),
        )
        .route(
            "/{id}/expenses",
            get(groups::expenses).post(groups::create_expense),
        )
}

fn invite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(invites::pending))
        .route("/{id}/accept", post(invites::accept))
        .route("/{id}/decline", post(invites::decline))
}

fn upi_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(upi::list).post(upi::create))
        .route("/{id}", put(upi::update).delete(upi::delete))
        .route("/{id}/qr", get(upi::qr))
}

/// Cookies need credentialed CORS, which rules out a wildcard origin
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let Some(origin) = config.cors_origin.as_deref() else {
        if config.is_development() {
            return CorsLayer::very_permissive();
        }
        warn!("CORS_ORIGIN not set; cross-origin requests will be refused");
        return CorsLayer::new();
    };

    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(_) => {
            warn!("Invalid CORS_ORIGIN {}; cross-origin requests will be refused", origin);
            CorsLayer::new()
        }
    }
}
