use std::sync::Arc;

use crate::{
    auth::AdminCredentials,
    config::{Config, SessionBackend},
    db::Database,
    rate_limit::RateLimiter,
    session::Sessions,
    store::{
        memory::MemorySessionStore, postgres::PgSessionStore, PortfolioStore, ProfileStore,
        SessionStore, Stores,
    },
    upload::UploadStore,
    views::Views,
};

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Database,
    pub portfolios: Arc<dyn PortfolioStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub sessions: Sessions,
    pub credentials: Arc<AdminCredentials>,
    pub uploads: UploadStore,
    pub views: Arc<Views>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: Config, database: Database) -> Result<Self, tera::Error> {
        let Stores {
            portfolios,
            profiles,
        } = Stores::for_database(&database);

        let session_store: Arc<dyn SessionStore> = match (&database, config.session_backend) {
            (_, Some(SessionBackend::Memory)) => Arc::new(MemorySessionStore::default()),
            (Database::Postgres(pool), _) => Arc::new(PgSessionStore::new(pool.clone())),
            (Database::Memory, Some(SessionBackend::Postgres)) => {
                tracing::warn!("SESSION_STORE=postgres but no database; keeping sessions in memory");
                Arc::new(MemorySessionStore::default())
            }
            (Database::Memory, None) => Arc::new(MemorySessionStore::default()),
        };

        let sessions = Sessions::new(
            session_store,
            &config.session_secret,
            config.session_ttl_hours,
            config.is_production(),
        );

        Ok(Self {
            credentials: Arc::new(AdminCredentials::from_config(&config)),
            uploads: UploadStore::new(config.upload_dir.clone()),
            views: Arc::new(Views::new()?),
            rate_limiter: RateLimiter::new(
                config.rate_limit.max_requests,
                config.rate_limit.window_secs,
            ),
            config: Arc::new(config),
            database,
            portfolios,
            profiles,
            sessions,
        })
    }
}
