//! Error types and their HTTP rendering.
//!
//! Handlers return [`PageError`] (HTML) or [`ApiError`] (JSON). Both only
//! attach an [`ErrorReport`] to an empty response; [`render_errors`] fills in
//! the body, since it has the configuration and templates at hand.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::{forms::ValidationError, state::AppState, store::StoreError, upload::UploadError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upload(UploadError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upload(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn report(&self, format: ErrorFormat) -> ErrorReport {
        let status = self.status();
        let (message, detail) = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            ("Internal Server Error".to_string(), Some(format!("{:?}", self)))
        } else {
            (self.to_string(), None)
        };
        ErrorReport {
            status,
            message,
            detail,
            format,
        }
    }
}

/// Failures that stop the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
    #[error("failed to load templates: {0}")]
    Templates(#[from] tera::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFormat {
    Html,
    Json,
}

/// What went wrong, waiting to be rendered.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
    /// Underlying cause; only shown in development.
    pub detail: Option<String>,
    pub format: ErrorFormat,
}

/// Error on an HTML page route.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl<E> From<E> for PageError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        PageError(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let report = self.0.report(ErrorFormat::Html);
        (report.status, Extension(report)).into_response()
    }
}

/// Error on a JSON route.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.0.report(ErrorFormat::Json);
        (report.status, Extension(report)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct JsonErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

/// Turn attached [`ErrorReport`]s into HTML pages or JSON bodies.
pub async fn render_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let admin = request.uri().path().starts_with("/admin");
    let mut response = next.run(request).await;

    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };

    let detail = report
        .detail
        .as_deref()
        .filter(|_| state.config.is_development());

    match report.format {
        ErrorFormat::Json => (
            report.status,
            Json(JsonErrorBody {
                error: &report.message,
                details: detail,
            }),
        )
            .into_response(),
        ErrorFormat::Html => match state.views.error_page(&report, detail, admin) {
            Ok(html) => (report.status, html).into_response(),
            Err(e) => {
                tracing::error!("Failed to render error page: {}", e);
                (report.status, Html(report.message.clone())).into_response()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::NotFound("Portfolio").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Validation(ValidationError::Required("Title")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Upload(UploadError::TooLarge).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Store(StoreError::Corrupt("x".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_message_but_keep_detail() {
        let report = AppError::Store(StoreError::Corrupt("row 7".to_string())).report(ErrorFormat::Json);
        assert_eq!(report.message, "Internal Server Error");
        assert!(report.detail.unwrap().contains("row 7"));

        let report = AppError::NotFound("Portfolio").report(ErrorFormat::Html);
        assert_eq!(report.message, "Portfolio not found");
        assert!(report.detail.is_none());
    }

    #[test]
    fn test_page_error_attaches_report() {
        let response = PageError::from(AppError::NotFound("Page")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.format, ErrorFormat::Html);
    }
}
