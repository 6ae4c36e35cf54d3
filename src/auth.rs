/**
 * Admin Authentication
 * Credential check against configured values and the session gate
 */
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{config::Config, routes::ErrorResponse, session, state::AppState};

pub const LOGIN_PATH: &str = "/admin/login";

/// The single operator's login, taken from configuration.
///
/// There is no user table: the submitted email and password are compared
/// with the configured pair. A bcrypt hash, when configured, replaces the
/// plain password.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    email: String,
    password: String,
    password_hash: Option<String>,
}

impl AdminCredentials {
    pub fn from_config(config: &Config) -> Self {
        Self {
            email: config.admin_email.clone(),
            password: config.admin_password.clone(),
            password_hash: config.admin_password_hash.clone(),
        }
    }

    pub async fn verify(&self, email: &str, password: &str) -> bool {
        let email_ok = constant_time_eq(email.as_bytes(), self.email.as_bytes());

        let password_ok = match &self.password_hash {
            Some(hash) => {
                let hash = hash.clone();
                let password = password.to_string();
                // bcrypt is CPU-bound; keep it off the async workers.
                match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await {
                    Ok(Ok(valid)) => valid,
                    Ok(Err(e)) => {
                        tracing::error!("Configured ADMIN_HASH_PASSWORD is not a bcrypt hash: {}", e);
                        false
                    }
                    Err(e) => {
                        tracing::error!("Password verification task failed: {}", e);
                        false
                    }
                }
            }
            None => constant_time_eq(password.as_bytes(), self.password.as_bytes()),
        };

        email_ok && password_ok
    }
}

/// Compare fixed-length digests so neither content nor length leaks through timing.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let hash_a = Sha256::digest(a);
    let hash_b = Sha256::digest(b);
    hash_a.ct_eq(&hash_b).into()
}

/// An authenticated admin. Extracting it is the admin gate.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub email: String,
    pub token: String,
}

/// Missing or expired session. Page routes send the browser to the login form.
#[derive(Debug)]
pub struct AuthRedirect;

impl AuthRedirect {
    /// The same rejection as a JSON 401, for data routes.
    pub fn into_json(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Authorization required".to_string(),
                message: None,
            }),
        )
            .into_response()
    }
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session::token_from_headers(&parts.headers).ok_or(AuthRedirect)?;

        match state.sessions.lookup(&token).await {
            Ok(Some(record)) => Ok(AdminSession {
                email: record.email,
                token,
            }),
            Ok(None) => Err(AuthRedirect),
            Err(e) => {
                tracing::error!("Session lookup failed: {}", e);
                Err(AuthRedirect)
            }
        }
    }
}
