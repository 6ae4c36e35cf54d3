pub mod models;

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};

use crate::store::StoreError;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl DbConfig {
    pub fn from_env(url: String) -> Self {
        Self {
            url,
            max_connections: std::env::var("DB_POOL_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_connections: std::env::var("DB_POOL_MIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            connect_timeout_secs: std::env::var("DB_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            idle_timeout_secs: std::env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }
}

/// Where records live for this process.
#[derive(Debug, Clone)]
pub enum Database {
    Postgres(Arc<PgPool>),
    Memory,
}

impl Database {
    pub fn kind(&self) -> &'static str {
        match self {
            Database::Postgres(_) => "postgres",
            Database::Memory => "in-memory",
        }
    }

    /// Round-trip time of a trivial query. The in-memory backend is always up.
    pub async fn ping(&self) -> Result<Duration, StoreError> {
        match self {
            Database::Postgres(pool) => {
                let start = std::time::Instant::now();
                sqlx::query("SELECT 1").fetch_one(pool.as_ref()).await?;
                Ok(start.elapsed())
            }
            Database::Memory => Ok(Duration::ZERO),
        }
    }
}

pub async fn init_pool(config: &DbConfig) -> Result<Arc<PgPool>, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!(
        "Database URL: {}",
        config.url.replace(
            |c: char| !c.is_ascii_alphanumeric() && c != ':' && c != '/' && c != '@' && c != '.',
            "*"
        )
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS portfolios (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            technologies TEXT[] NOT NULL DEFAULT '{}',
            project_url TEXT,
            github_url TEXT,
            image_url TEXT NOT NULL DEFAULT '',
            featured BOOLEAN NOT NULL DEFAULT false,
            "order" INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::raw_sql(
        r#"
        CREATE INDEX IF NOT EXISTS idx_portfolios_category ON portfolios(category);
        CREATE INDEX IF NOT EXISTS idx_portfolios_featured ON portfolios(featured);
        CREATE INDEX IF NOT EXISTS idx_portfolios_display
            ON portfolios("order" ASC, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_portfolios_created_at ON portfolios(created_at DESC)
        "#,
    )
    .execute(pool)
    .await?;

    // The constrained `singleton` key allows at most one profile row.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            singleton BOOLEAN PRIMARY KEY DEFAULT true CHECK (singleton),
            id UUID NOT NULL DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            title TEXT NOT NULL,
            bio TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            avatar TEXT NOT NULL DEFAULT '',
            resume TEXT NOT NULL DEFAULT '',
            social JSONB NOT NULL DEFAULT '{}',
            skills JSONB NOT NULL DEFAULT '[]',
            experience JSONB NOT NULL DEFAULT '[]',
            education JSONB NOT NULL DEFAULT '[]',
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admin_sessions (
            key TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            expires_at TIMESTAMPTZ NOT NULL
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_admin_sessions_expires_at
            ON admin_sessions(expires_at)
    "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");

    Ok(())
}
