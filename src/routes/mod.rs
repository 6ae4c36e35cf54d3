/**
 * Routes Module
 * Page, admin, data API and health handlers
 */
use serde::{Deserialize, Serialize};

pub mod admin;
pub mod api;
pub mod health;
pub mod pages;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Success response (for delete)
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

/// Ids arrive as free text; anything that is not a UUID names nothing.
pub(crate) fn parse_id(raw: &str) -> Option<uuid::Uuid> {
    uuid::Uuid::parse_str(raw).ok()
}
