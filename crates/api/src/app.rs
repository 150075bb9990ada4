use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use shared::clock::Clock;
use shared::jwt::JwtConfig;

use crate::config::Config;
use crate::middleware::{auth_rate_limit, general_rate_limit, trace_id, RateLimiters};
use crate::routes::{auth, events, health, registrations};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub clock: Clock,
    pub jwt: JwtConfig,
    pub limiters: Arc<RateLimiters>,
}

pub fn create_app(config: Config, pool: PgPool, clock: Clock) -> Router {
    crate::error::set_expose_internal_errors(!config.is_production());

    let jwt = JwtConfig::new(&config.jwt.secret, config.jwt.access_token_expiry_secs);
    let limiters = Arc::new(RateLimiters::new(
        config.security.rate_limit_per_minute,
        config.security.auth_rate_limit_per_minute,
    ));
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
        clock,
        jwt,
        limiters,
    };

    // Build CORS layer: explicit origins from config, permissive when unset
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Authentication routes sit behind the stricter auth quota
    let auth_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_rate_limit,
        ));

    // Event and registration routes under the general quota
    let api_routes = Router::new()
        .route("/api/events", post(events::create_event))
        .route("/api/events/upcoming", get(events::list_upcoming))
        .route(
            "/api/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/api/events/:id/stats", get(events::event_stats))
        .route("/api/events/:id/register", post(registrations::register))
        .route(
            "/api/events/:id/register/:user_id",
            delete(registrations::cancel),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            general_rate_limit,
        ));

    let public_routes = Router::new().route("/health", get(health::health_check));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id)) // Request ID and logging
        .layer(cors)
        .with_state(state)
}
