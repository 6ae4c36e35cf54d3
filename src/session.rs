//! Server-side admin sessions.
//!
//! The browser only ever holds a random token. Records are stored under a
//! SHA-256 digest of the session secret and that token, so a leaked store
//! does not hand out usable cookies.

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use rand::distr::{Alphanumeric, SampleString};
use sha2::{Digest, Sha256};
use std::{sync::Arc, time::Duration as StdDuration};

use crate::{
    config::MAX_SESSION_TTL_HOURS,
    store::{SessionRecord, SessionStore, StoreError},
};

pub const SESSION_COOKIE: &str = "portfolio.sid";
const TOKEN_LENGTH: usize = 64;

#[derive(Clone)]
pub struct Sessions {
    store: Arc<dyn SessionStore>,
    secret: Arc<str>,
    ttl: Duration,
    secure_cookie: bool,
}

impl Sessions {
    pub fn new(
        store: Arc<dyn SessionStore>,
        secret: &str,
        ttl_hours: i64,
        secure_cookie: bool,
    ) -> Self {
        let ttl_hours = ttl_hours.clamp(-MAX_SESSION_TTL_HOURS, MAX_SESSION_TTL_HOURS);
        Self {
            store,
            secret: Arc::from(secret),
            ttl: Duration::hours(ttl_hours),
            secure_cookie,
        }
    }

    fn key(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Create an authenticated session for `email`; returns the cookie token.
    pub async fn start(&self, email: &str) -> Result<String, StoreError> {
        let token = Alphanumeric.sample_string(&mut rand::rng(), TOKEN_LENGTH);
        let now = Utc::now();
        self.store
            .insert(
                &self.key(&token),
                SessionRecord {
                    email: email.to_string(),
                    created_at: now,
                    expires_at: now + self.ttl,
                },
            )
            .await?;
        Ok(token)
    }

    /// Live session for `token`. Expired records are removed on sight.
    pub async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let key = self.key(token);
        match self.store.get(&key).await? {
            Some(record) if record.expires_at > Utc::now() => Ok(Some(record)),
            Some(_) => {
                self.store.remove(&key).await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub async fn end(&self, token: &str) -> Result<(), StoreError> {
        self.store.remove(&self.key(token)).await
    }

    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        self.store.purge_expired(Utc::now()).await
    }

    pub fn cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .max_age(time::Duration::seconds(self.ttl.num_seconds()))
            .build()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .max_age(time::Duration::ZERO)
            .build()
    }
}

/// Session token carried by the request's `Cookie` headers, if any.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

/// Periodically drop expired sessions so the store stays proportional to
/// active logins.
pub fn spawn_purge_task(sessions: Sessions, every: StdDuration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "purged expired sessions"),
                Err(e) => tracing::warn!(error = %e, "failed to purge expired sessions"),
            }
        }
    })
}
