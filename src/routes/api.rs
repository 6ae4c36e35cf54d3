/**
 * Data API
 * Public read-only JSON projections of the stores
 */
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    db::models::{Portfolio, PortfolioFilter, Profile},
    error::{ApiError, AppError},
    routes::parse_id,
    state::AppState,
};

/// Query parameters for GET /api/portfolios
#[derive(Debug, Default, Deserialize)]
pub struct PortfolioQuery {
    pub category: Option<String>,
    pub featured: Option<String>,
}

impl PortfolioQuery {
    /// Only `featured=true` narrows the list; any other value is ignored.
    fn into_filter(self) -> PortfolioFilter {
        PortfolioFilter {
            category: self.category.filter(|c| !c.is_empty()),
            featured: (self.featured.as_deref() == Some("true")).then_some(true),
        }
    }
}

/// GET /api/portfolios
pub async fn list_portfolios(
    State(state): State<AppState>,
    Query(query): Query<PortfolioQuery>,
) -> Result<Json<Vec<Portfolio>>, ApiError> {
    let portfolios = state.portfolios.list(&query.into_filter()).await?;
    Ok(Json(portfolios))
}

/// GET /api/portfolios/{id}
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Portfolio>, ApiError> {
    let portfolio = match parse_id(&id) {
        Some(id) => state.portfolios.get(id).await?,
        None => None,
    };
    portfolio
        .map(Json)
        .ok_or(ApiError(AppError::NotFound("Portfolio")))
}

/// GET /api/profile
pub async fn get_profile(State(state): State<AppState>) -> Result<Json<Profile>, ApiError> {
    state
        .profiles
        .get()
        .await?
        .map(Json)
        .ok_or(ApiError(AppError::NotFound("Profile")))
}

/// GET /api/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.portfolios.distinct_categories().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::models::{PortfolioInput, ProfileInput, SocialLinks},
        test_support::{body_json, get, test_app},
    };
    use axum::http::StatusCode;
    use std::collections::HashSet;

    fn entry(title: &str, category: &str, featured: bool) -> PortfolioInput {
        PortfolioInput {
            title: title.to_string(),
            description: "d".to_string(),
            category: category.to_string(),
            technologies: vec![],
            project_url: None,
            github_url: None,
            image_url: None,
            featured,
            order: 0,
        }
    }

    #[test]
    fn test_query_to_filter() {
        let filter = PortfolioQuery {
            category: Some(String::new()),
            featured: Some("false".to_string()),
        }
        .into_filter();
        assert_eq!(filter.category, None);
        assert_eq!(filter.featured, None);

        let filter = PortfolioQuery {
            category: Some("web".to_string()),
            featured: Some("true".to_string()),
        }
        .into_filter();
        assert_eq!(filter.category.as_deref(), Some("web"));
        assert_eq!(filter.featured, Some(true));
    }

    #[tokio::test]
    async fn test_featured_filter() {
        let (app, state, _dir) = test_app();
        state.portfolios.create(entry("A", "web", true)).await.unwrap();
        state.portfolios.create(entry("B", "web", false)).await.unwrap();
        state.portfolios.create(entry("C", "mobile", true)).await.unwrap();

        let response = get(&app, "/api/portfolios?featured=true").await;
        assert_eq!(response.status(), StatusCode::OK);
        let items: Vec<serde_json::Value> = body_json(response).await;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|p| p["featured"] == true));

        let items: Vec<serde_json::Value> = body_json(get(&app, "/api/portfolios").await).await;
        assert_eq!(items.len(), 3);

        let items: Vec<serde_json::Value> =
            body_json(get(&app, "/api/portfolios?category=web&featured=true").await).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "A");
    }

    #[tokio::test]
    async fn test_get_portfolio_and_not_found() {
        let (app, state, _dir) = test_app();
        let created = state.portfolios.create(entry("A", "web", false)).await.unwrap();

        let response = get(&app, &format!("/api/portfolios/{}", created.id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body["title"], "A");
        assert_eq!(body["imageUrl"], "");

        let response = get(&app, "/api/portfolios/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body["error"], "Portfolio not found");
    }

    #[tokio::test]
    async fn test_profile_absent_then_present() {
        let (app, state, _dir) = test_app();
        assert_eq!(get(&app, "/api/profile").await.status(), StatusCode::NOT_FOUND);

        state
            .profiles
            .upsert(ProfileInput {
                name: "Jane".to_string(),
                title: "Engineer".to_string(),
                bio: "Bio".to_string(),
                email: "jane@example.com".to_string(),
                phone: String::new(),
                location: String::new(),
                social: SocialLinks::default(),
                avatar: None,
                skills: None,
                experience: None,
                education: None,
            })
            .await
            .unwrap();

        let body: serde_json::Value = body_json(get(&app, "/api/profile").await).await;
        assert_eq!(body["name"], "Jane");
    }

    #[tokio::test]
    async fn test_distinct_categories() {
        let (app, state, _dir) = test_app();
        for category in ["web", "web", "mobile"] {
            state.portfolios.create(entry("x", category, false)).await.unwrap();
        }

        let categories: Vec<String> = body_json(get(&app, "/api/categories").await).await;
        let categories: HashSet<String> = categories.into_iter().collect();
        assert_eq!(
            categories,
            HashSet::from(["web".to_string(), "mobile".to_string()])
        );
    }
}
