/**
 * Public Pages
 * Server-rendered views over the profile and portfolio stores
 */
use axum::{
    extract::{Path, State},
    response::Html,
};
use tera::Context;

use crate::{
    db::models::{Portfolio, PortfolioFilter},
    error::{AppError, PageError},
    routes::parse_id,
    state::AppState,
    store::RELATED_LIMIT,
};

const SITE_TITLE: &str = "Portfolio";

/// Context every public page starts from: the profile (if any) and a title.
async fn base_context(state: &AppState, title: &str) -> Result<Context, PageError> {
    let mut context = Context::new();
    context.insert("profile", &state.profiles.get().await?);
    context.insert("title", title);
    Ok(context)
}

/// GET / - profile, all entries and the featured subset
pub async fn home(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let portfolios = state.portfolios.list(&PortfolioFilter::default()).await?;
    let featured: Vec<&Portfolio> = portfolios.iter().filter(|p| p.featured).collect();

    let mut context = base_context(&state, SITE_TITLE).await?;
    context.insert("portfolios", &portfolios);
    context.insert("featured_portfolios", &featured);
    Ok(state.views.render("index.html", &context)?)
}

/// GET /portfolio/{id} - one entry plus a few from the same category
pub async fn portfolio_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, PageError> {
    let portfolio = match parse_id(&id) {
        Some(id) => state.portfolios.get(id).await?,
        None => None,
    }
    .ok_or(AppError::NotFound("Portfolio"))?;

    let related = state.portfolios.related(&portfolio, RELATED_LIMIT).await?;

    let mut context = base_context(&state, &portfolio.title).await?;
    context.insert("portfolio", &portfolio);
    context.insert("related", &related);
    Ok(state.views.render("portfolio_detail.html", &context)?)
}

/// GET /category/{category}
pub async fn category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Html<String>, PageError> {
    let filter = PortfolioFilter {
        category: Some(category.clone()),
        featured: None,
    };
    let portfolios = state.portfolios.list(&filter).await?;
    let category_title = capitalize(&category);

    let mut context = base_context(&state, &format!("{} Projects", category_title)).await?;
    context.insert("category", &category);
    context.insert("category_title", &category_title);
    context.insert("portfolios", &portfolios);
    Ok(state.views.render("category.html", &context)?)
}

/// GET /about
pub async fn about(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let context = base_context(&state, "About").await?;
    Ok(state.views.render("about.html", &context)?)
}

/// GET /contact
pub async fn contact(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let context = base_context(&state, "Contact").await?;
    Ok(state.views.render("contact.html", &context)?)
}

/// Router fallback for anything unmatched.
pub async fn not_found() -> PageError {
    PageError(AppError::NotFound("Page"))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::models::PortfolioInput,
        test_support::{body_string, get, test_app},
    };
    use axum::http::StatusCode;

    fn entry(title: &str, category: &str, featured: bool) -> PortfolioInput {
        PortfolioInput {
            title: title.to_string(),
            description: format!("{} description", title),
            category: category.to_string(),
            technologies: vec!["Rust".to_string()],
            project_url: None,
            github_url: None,
            image_url: None,
            featured,
            order: 0,
        }
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("web"), "Web");
        assert_eq!(capitalize(""), "");
    }

    #[tokio::test]
    async fn test_home_lists_entries() {
        let (app, state, _dir) = test_app();
        state.portfolios.create(entry("Shop", "web", true)).await.unwrap();
        state.portfolios.create(entry("Game", "mobile", false)).await.unwrap();

        let response = get(&app, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("Featured Projects"));
        assert!(body.contains("Shop"));
        assert!(body.contains("Game"));
    }

    #[tokio::test]
    async fn test_unknown_portfolio_renders_not_found_page() {
        let (app, _state, _dir) = test_app();

        let response = get(&app, &format!("/portfolio/{}", uuid::Uuid::new_v4())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("404"));

        let response = get(&app, "/portfolio/not-a-uuid").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_detail_shows_related_from_same_category() {
        let (app, state, _dir) = test_app();
        let main = state.portfolios.create(entry("Main", "web", false)).await.unwrap();
        state.portfolios.create(entry("Sibling", "web", false)).await.unwrap();
        state.portfolios.create(entry("Stranger", "mobile", false)).await.unwrap();

        let response = get(&app, &format!("/portfolio/{}", main.id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("Sibling"));
        assert!(!body.contains("Stranger"));
    }

    #[tokio::test]
    async fn test_category_page_filters() {
        let (app, state, _dir) = test_app();
        state.portfolios.create(entry("Shop", "web", false)).await.unwrap();
        state.portfolios.create(entry("Game", "mobile", false)).await.unwrap();

        let body = body_string(get(&app, "/category/web").await).await;
        assert!(body.contains("Web Projects"));
        assert!(body.contains("Shop"));
        assert!(!body.contains("Game"));
    }

    #[tokio::test]
    async fn test_unmatched_route_is_not_found_page() {
        let (app, _state, _dir) = test_app();
        let response = get(&app, "/nowhere").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("404"));
    }
}
