//! In-memory backend used when no database is configured, and in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PortfolioStore, ProfileStore, SessionRecord, SessionStore, StoreError};
use crate::db::models::{
    Portfolio, PortfolioFilter, PortfolioInput, PortfolioPage, Profile, ProfileInput,
};

#[derive(Default)]
pub struct MemoryPortfolioStore {
    entries: RwLock<Vec<Portfolio>>,
}

fn display_order(a: &Portfolio, b: &Portfolio) -> std::cmp::Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[async_trait]
impl PortfolioStore for MemoryPortfolioStore {
    async fn list(&self, filter: &PortfolioFilter) -> Result<Vec<Portfolio>, StoreError> {
        let entries = self.entries.read().await;
        let mut matching: Vec<Portfolio> =
            entries.iter().filter(|p| filter.matches(p)).cloned().collect();
        matching.sort_by(display_order);
        Ok(matching)
    }

    async fn list_recent(&self, page: i64, per_page: i64) -> Result<PortfolioPage, StoreError> {
        let entries = self.entries.read().await;
        let mut all: Vec<Portfolio> = entries.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(PortfolioPage::offset(page, per_page) as usize)
            .take(per_page as usize)
            .collect();
        Ok(PortfolioPage::new(items, page, per_page, total))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Portfolio>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, input: PortfolioInput) -> Result<Portfolio, StoreError> {
        let portfolio = Portfolio::from_input(input);
        self.entries.write().await.push(portfolio.clone());
        Ok(portfolio)
    }

    async fn update(
        &self,
        id: Uuid,
        input: PortfolioInput,
    ) -> Result<Option<Portfolio>, StoreError> {
        let mut entries = self.entries.write().await;
        Ok(entries.iter_mut().find(|p| p.id == id).map(|portfolio| {
            portfolio.apply(input);
            portfolio.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|p| p.id != id);
        Ok(entries.len() != before)
    }

    async fn distinct_categories(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().await;
        let categories: BTreeSet<String> = entries.iter().map(|p| p.category.clone()).collect();
        Ok(categories.into_iter().collect())
    }

    async fn related(
        &self,
        portfolio: &Portfolio,
        limit: usize,
    ) -> Result<Vec<Portfolio>, StoreError> {
        let entries = self.entries.read().await;
        let mut related: Vec<Portfolio> = entries
            .iter()
            .filter(|p| p.id != portfolio.id && p.category == portfolio.category)
            .cloned()
            .collect();
        related.sort_by(display_order);
        related.truncate(limit);
        Ok(related)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.entries.read().await.len() as i64)
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profile: RwLock<Option<Profile>>,
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self) -> Result<Option<Profile>, StoreError> {
        Ok(self.profile.read().await.clone())
    }

    async fn get_or_create(&self) -> Result<Profile, StoreError> {
        let mut profile = self.profile.write().await;
        Ok(profile.get_or_insert_with(Profile::placeholder).clone())
    }

    async fn upsert(&self, input: ProfileInput) -> Result<Profile, StoreError> {
        let mut profile = self.profile.write().await;
        match profile.as_mut() {
            Some(existing) => existing.merge(input),
            None => *profile = Some(Profile::from_input(input)),
        }
        profile
            .clone()
            .ok_or_else(|| StoreError::Corrupt("profile vanished during upsert".to_string()))
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, key: &str, record: SessionRecord) -> Result<(), StoreError> {
        self.sessions.write().await.insert(key.to_string(), record);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(key);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| record.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}
