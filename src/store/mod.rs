//! Persistence seams for portfolio entries, the profile and admin sessions.
//!
//! Every operation touches a single record, so neither backend needs
//! multi-record transactions.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{
    models::{Portfolio, PortfolioFilter, PortfolioInput, PortfolioPage, Profile, ProfileInput},
    Database,
};

/// Entries shown next to a portfolio on its detail page.
pub const RELATED_LIMIT: usize = 3;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// Public ordering: `order` ascending, then newest first.
    async fn list(&self, filter: &PortfolioFilter) -> Result<Vec<Portfolio>, StoreError>;

    /// Admin ordering: newest first, paginated.
    async fn list_recent(&self, page: i64, per_page: i64) -> Result<PortfolioPage, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Portfolio>, StoreError>;

    async fn create(&self, input: PortfolioInput) -> Result<Portfolio, StoreError>;

    async fn update(&self, id: Uuid, input: PortfolioInput)
        -> Result<Option<Portfolio>, StoreError>;

    /// `false` when nothing had that id.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn distinct_categories(&self) -> Result<Vec<String>, StoreError>;

    /// Other entries in the same category as `portfolio`.
    async fn related(&self, portfolio: &Portfolio, limit: usize)
        -> Result<Vec<Portfolio>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self) -> Result<Option<Profile>, StoreError>;

    /// Returns the stored profile, persisting a placeholder first if none exists.
    async fn get_or_create(&self) -> Result<Profile, StoreError>;

    /// Merge `input` onto the stored profile, creating it when absent.
    async fn upsert(&self, input: ProfileInput) -> Result<Profile, StoreError>;
}

/// Server-side record behind an admin session cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, key: &str, record: SessionRecord) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<SessionRecord>, StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Drop every record whose expiry is before `now`; returns how many went.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// The stores of one backend, shared by every request.
#[derive(Clone)]
pub struct Stores {
    pub portfolios: Arc<dyn PortfolioStore>,
    pub profiles: Arc<dyn ProfileStore>,
}

impl Stores {
    pub fn for_database(database: &Database) -> Self {
        match database {
            Database::Postgres(pool) => Self {
                portfolios: Arc::new(postgres::PgPortfolioStore::new(pool.clone())),
                profiles: Arc::new(postgres::PgProfileStore::new(pool.clone())),
            },
            Database::Memory => Self {
                portfolios: Arc::new(memory::MemoryPortfolioStore::default()),
                profiles: Arc::new(memory::MemoryProfileStore::default()),
            },
        }
    }
}
