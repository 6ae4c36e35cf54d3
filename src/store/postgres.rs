//! PostgreSQL backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use super::{PortfolioStore, ProfileStore, SessionRecord, SessionStore, StoreError};
use crate::db::models::{
    Education, Experience, Portfolio, PortfolioFilter, PortfolioInput, PortfolioPage, Profile,
    ProfileInput, Skill, SocialLinks,
};

const PORTFOLIO_COLUMNS: &str = r#"id, title, description, category, technologies, project_url,
    github_url, image_url, featured, "order", created_at, updated_at"#;

const PROFILE_COLUMNS: &str = "id, name, title, bio, email, phone, location, avatar, resume, \
    social, skills, experience, education, updated_at";

pub struct PgPortfolioStore {
    pool: Arc<PgPool>,
}

impl PgPortfolioStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PortfolioStore for PgPortfolioStore {
    async fn list(&self, filter: &PortfolioFilter) -> Result<Vec<Portfolio>, StoreError> {
        let portfolios = sqlx::query_as::<_, Portfolio>(&format!(
            r#"
            SELECT {PORTFOLIO_COLUMNS}
            FROM portfolios
            WHERE ($1::TEXT IS NULL OR category = $1)
              AND ($2::BOOLEAN IS NULL OR featured = $2)
            ORDER BY "order" ASC, created_at DESC
            "#
        ))
        .bind(filter.category.as_deref())
        .bind(filter.featured)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(portfolios)
    }

    async fn list_recent(&self, page: i64, per_page: i64) -> Result<PortfolioPage, StoreError> {
        let items = sqlx::query_as::<_, Portfolio>(&format!(
            r#"
            SELECT {PORTFOLIO_COLUMNS}
            FROM portfolios
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(per_page)
        .bind(PortfolioPage::offset(page, per_page))
        .fetch_all(self.pool.as_ref())
        .await?;

        let total = self.count().await?;
        Ok(PortfolioPage::new(items, page, per_page, total))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Portfolio>, StoreError> {
        let portfolio = sqlx::query_as::<_, Portfolio>(&format!(
            "SELECT {PORTFOLIO_COLUMNS} FROM portfolios WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(portfolio)
    }

    async fn create(&self, input: PortfolioInput) -> Result<Portfolio, StoreError> {
        let portfolio = sqlx::query_as::<_, Portfolio>(&format!(
            r#"
            INSERT INTO portfolios
                (title, description, category, technologies, project_url, github_url,
                 image_url, featured, "order")
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PORTFOLIO_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.category)
        .bind(&input.technologies)
        .bind(&input.project_url)
        .bind(&input.github_url)
        .bind(input.image_url.as_deref().unwrap_or(""))
        .bind(input.featured)
        .bind(input.order)
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(portfolio)
    }

    async fn update(
        &self,
        id: Uuid,
        input: PortfolioInput,
    ) -> Result<Option<Portfolio>, StoreError> {
        let portfolio = sqlx::query_as::<_, Portfolio>(&format!(
            r#"
            UPDATE portfolios SET
                title = $2,
                description = $3,
                category = $4,
                technologies = $5,
                project_url = $6,
                github_url = $7,
                image_url = COALESCE($8, image_url),
                featured = $9,
                "order" = $10,
                updated_at = now()
            WHERE id = $1
            RETURNING {PORTFOLIO_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.category)
        .bind(&input.technologies)
        .bind(&input.project_url)
        .bind(&input.github_url)
        .bind(&input.image_url)
        .bind(input.featured)
        .bind(input.order)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(portfolio)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM portfolios WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn distinct_categories(&self) -> Result<Vec<String>, StoreError> {
        let categories: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT category FROM portfolios ORDER BY category")
                .fetch_all(self.pool.as_ref())
                .await?;
        Ok(categories.into_iter().map(|(c,)| c).collect())
    }

    async fn related(
        &self,
        portfolio: &Portfolio,
        limit: usize,
    ) -> Result<Vec<Portfolio>, StoreError> {
        let related = sqlx::query_as::<_, Portfolio>(&format!(
            r#"
            SELECT {PORTFOLIO_COLUMNS}
            FROM portfolios
            WHERE id <> $1 AND category = $2
            ORDER BY "order" ASC, created_at DESC
            LIMIT $3
            "#
        ))
        .bind(portfolio.id)
        .bind(&portfolio.category)
        .bind(limit as i64)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(related)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM portfolios")
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(total)
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    name: String,
    title: String,
    bio: String,
    email: String,
    phone: String,
    location: String,
    avatar: String,
    resume: String,
    social: Json<SocialLinks>,
    skills: Json<Vec<Skill>>,
    experience: Json<Vec<Experience>>,
    education: Json<Vec<Education>>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            title: row.title,
            bio: row.bio,
            email: row.email,
            phone: row.phone,
            location: row.location,
            avatar: row.avatar,
            resume: row.resume,
            social: row.social.0,
            skills: row.skills.0,
            experience: row.experience.0,
            education: row.education.0,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgProfileStore {
    pool: Arc<PgPool>,
}

impl PgProfileStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Write the whole record. The singleton key turns a second insert into an update.
    async fn save(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            INSERT INTO profiles
                (id, name, title, bio, email, phone, location, avatar, resume,
                 social, skills, experience, education, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, now())
            ON CONFLICT (singleton) DO UPDATE SET
                name = EXCLUDED.name,
                title = EXCLUDED.title,
                bio = EXCLUDED.bio,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                location = EXCLUDED.location,
                avatar = EXCLUDED.avatar,
                resume = EXCLUDED.resume,
                social = EXCLUDED.social,
                skills = EXCLUDED.skills,
                experience = EXCLUDED.experience,
                education = EXCLUDED.education,
                updated_at = now()
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(profile.id)
        .bind(&profile.name)
        .bind(&profile.title)
        .bind(&profile.bio)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.location)
        .bind(&profile.avatar)
        .bind(&profile.resume)
        .bind(Json(&profile.social))
        .bind(Json(&profile.skills))
        .bind(Json(&profile.experience))
        .bind(Json(&profile.education))
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(row.into())
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get(&self) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles LIMIT 1"
        ))
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(row.map(Profile::from))
    }

    async fn get_or_create(&self) -> Result<Profile, StoreError> {
        if let Some(profile) = self.get().await? {
            return Ok(profile);
        }

        // Concurrent first visits may both insert; the conflict clause keeps one row.
        let placeholder = Profile::placeholder();
        sqlx::query(
            r#"
            INSERT INTO profiles (id, name, title, bio, email, social)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (singleton) DO NOTHING
            "#,
        )
        .bind(placeholder.id)
        .bind(&placeholder.name)
        .bind(&placeholder.title)
        .bind(&placeholder.bio)
        .bind(&placeholder.email)
        .bind(Json(&placeholder.social))
        .execute(self.pool.as_ref())
        .await?;

        self.get()
            .await?
            .ok_or_else(|| StoreError::Corrupt("profile missing after insert".to_string()))
    }

    async fn upsert(&self, input: ProfileInput) -> Result<Profile, StoreError> {
        let profile = match self.get().await? {
            Some(mut existing) => {
                existing.merge(input);
                existing
            }
            None => Profile::from_input(input),
        };
        self.save(&profile).await
    }
}

pub struct PgSessionStore {
    pool: Arc<PgPool>,
}

impl PgSessionStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, key: &str, record: SessionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO admin_sessions (key, email, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO UPDATE SET
                email = EXCLUDED.email,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(&record.email)
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<SessionRecord>, StoreError> {
        let row: Option<(String, DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            "SELECT email, created_at, expires_at FROM admin_sessions WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(row.map(|(email, created_at, expires_at)| SessionRecord {
            email,
            created_at,
            expires_at,
        }))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM admin_sessions WHERE key = $1")
            .bind(key)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected())
    }
}
