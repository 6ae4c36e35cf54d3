//! Portfolio Site - library for app logic and testing

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod logging;
pub mod rate_limit;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod upload;
pub mod views;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    response::Redirect,
    routing::{get, put},
    Router,
};
use std::{net::SocketAddr, time::Duration};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::{
    config::{Config, Environment},
    db::{Database, DbConfig},
    error::StartupError,
    logging::LogSettings,
    routes::{admin, api, health, pages},
    state::AppState,
};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
/// Falls back to the local dev server.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Response headers added to everything when `SECURITY_HEADERS` is on.
fn security_headers() -> [(HeaderName, HeaderValue); 5] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ),
    ]
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/admin/dashboard") }))
        .route("/login", get(admin::login_page).post(admin::login))
        .route("/logout", get(admin::logout))
        .route("/dashboard", get(admin::dashboard))
        .route(
            "/portfolios",
            get(admin::list_portfolios).post(admin::create_portfolio),
        )
        .route("/portfolios/new", get(admin::new_portfolio))
        .route(
            "/portfolios/{id}",
            put(admin::update_portfolio)
                .post(admin::update_portfolio)
                .delete(admin::delete_portfolio),
        )
        .route("/portfolios/{id}/edit", get(admin::edit_portfolio))
        .route("/profile", get(admin::profile_page).post(admin::update_profile))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/portfolios", get(api::list_portfolios))
        .route("/portfolios/{id}", get(api::get_portfolio))
        .route("/profile", get(api::get_profile))
        .route("/categories", get(api::list_categories))
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app = Router::new()
        .route("/", get(pages::home))
        .route("/portfolio/{id}", get(pages::portfolio_detail))
        .route("/category/{category}", get(pages::category))
        .route("/about", get(pages::about))
        .route("/contact", get(pages::contact))
        .route("/health", get(health::health))
        .route("/health/database", get(health::health_database))
        .nest("/admin", admin_routes())
        .nest("/api", api_routes())
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .fallback(pages::not_found)
        // Multipart reads are capped separately from the raw body limit
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error::render_errors,
        ));

    if config.rate_limit.enabled {
        app = app.layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit::limit_requests,
        ));
    }

    if config.security_headers {
        for (name, value) in security_headers() {
            app = app.layer(SetResponseHeaderLayer::if_not_present(name, value));
        }
    }

    app.layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(configure_cors())
        .with_state(state)
}

/// Connect to PostgreSQL when configured; otherwise, or when the pool cannot
/// be created, fall back to in-memory storage.
async fn connect_database(config: &Config) -> Database {
    let Some(url) = &config.database_url else {
        tracing::info!("DATABASE_URL not set. Using in-memory storage.");
        return Database::Memory;
    };

    match db::init_pool(&DbConfig::from_env(url.clone())).await {
        Ok(pool) => {
            if let Err(e) = db::run_migrations(&pool).await {
                tracing::error!("Failed to run database migrations: {}", e);
            }
            Database::Postgres(pool)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize database pool: {}. Falling back to in-memory storage.",
                e
            );
            Database::Memory
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    // Guards must be held for the programme's lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let environment = Environment::parse(&std::env::var("ENVIRONMENT").unwrap_or_default());
    let _log_guards = logging::init(&LogSettings::from_env(environment));

    health::init_start_time();

    let config = Config::from_env();
    config.validate().map_err(StartupError::Config)?;

    if config.uses_default_credentials() {
        tracing::warn!(
            "SECURITY: admin login uses the built-in default email or password. \
             Set ADMIN_EMAIL and ADMIN_HASH_PASSWORD (see the hash-password binary)."
        );
    }

    let database = connect_database(&config).await;
    tracing::info!(backend = database.kind(), "Storage ready");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState::new(config, database)?;
    session::spawn_purge_task(state.sessions.clone(), SESSION_PURGE_INTERVAL);

    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get, test_app, test_state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_security_headers_present() {
        let (app, _state, _dir) = test_app();
        let response = get(&app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
        assert!(headers.get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_security_headers_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), |config| config.security_headers = false);
        let app = create_app(state);
        let response = get(&app, "/health").await;
        assert!(response.headers().get("x-frame-options").is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_excess() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), |config| {
            config.rate_limit.enabled = true;
            config.rate_limit.max_requests = 2;
        });
        let app = create_app(state);

        assert_eq!(get(&app, "/health").await.status(), StatusCode::OK);
        assert_eq!(get(&app, "/health").await.status(), StatusCode::OK);
        assert_eq!(
            get(&app, "/health").await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_uploads_are_served() {
        let (app, _state, dir) = test_app();
        std::fs::write(dir.path().join("1-2.png"), b"png").unwrap();
        let response = get(&app, "/uploads/1-2.png").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
