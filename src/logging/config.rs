use std::path::PathBuf;

use crate::config::Environment;

/// How the subscriber is assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
    pub dir: PathBuf,
    /// JSON lines instead of human-readable output.
    pub json: bool,
}

impl LogSettings {
    pub fn new(environment: Environment, level: Option<String>, dir: Option<String>) -> Self {
        let production = environment == Environment::Production;
        Self {
            level: level
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| if production { "info" } else { "debug" }.to_string()),
            dir: dir
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs")),
            json: production,
        }
    }

    pub fn from_env(environment: Environment) -> Self {
        Self::new(
            environment,
            std::env::var("LOG_LEVEL").ok(),
            std::env::var("LOG_DIR").ok(),
        )
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn directives(&self) -> String {
        format!(
            "portfolio_site={},tower_http=debug,axum=debug,sqlx=warn",
            self.level
        )
    }
}
