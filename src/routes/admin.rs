/**
 * Admin Routes
 * Login, dashboard and authenticated CRUD over portfolios and the profile
 */
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use tera::Context;
use uuid::Uuid;

use crate::{
    auth::{AdminSession, AuthRedirect, LOGIN_PATH},
    error::{ApiError, AppError, PageError},
    forms::{PortfolioForm, ProfileForm},
    routes::{parse_id, SuccessResponse},
    state::AppState,
    upload::{MultipartForm, StoredUpload, UploadError},
};

const DASHBOARD_PATH: &str = "/admin/dashboard";
const PER_PAGE: i64 = 10;
const RECENT_COUNT: i64 = 5;
const INVALID_CREDENTIALS: &str = "Invalid email or password";

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Query string of the listing and profile pages.
#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    pub page: Option<String>,
    pub success: Option<String>,
}

impl AdminQuery {
    fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }
}

/// Which submission a portfolio form belongs to.
#[derive(Debug, Clone, Copy)]
enum FormTarget {
    New,
    Edit(Uuid),
}

impl FormTarget {
    fn action(&self) -> String {
        match self {
            FormTarget::New => "/admin/portfolios".to_string(),
            FormTarget::Edit(id) => format!("/admin/portfolios/{}", id),
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            FormTarget::New => "Add Portfolio",
            FormTarget::Edit(_) => "Edit Portfolio",
        }
    }
}

// ============================================================================
// Rendering helpers
// ============================================================================

fn admin_context(session: &AdminSession) -> Context {
    let mut context = Context::new();
    context.insert("admin_email", &session.email);
    context
}

fn render_login(
    state: &AppState,
    email: &str,
    error: Option<&str>,
    status: StatusCode,
) -> Result<Response, PageError> {
    let mut context = Context::new();
    context.insert("email", email);
    context.insert("error", &error);
    let page = state.views.render("admin/login.html", &context)?;
    Ok((status, page).into_response())
}

fn render_portfolio_form(
    state: &AppState,
    session: &AdminSession,
    form: &PortfolioForm,
    target: FormTarget,
    error: Option<String>,
    status: StatusCode,
) -> Result<Response, PageError> {
    let mut context = admin_context(session);
    context.insert("portfolio", form);
    context.insert("action", &target.action());
    context.insert("heading", target.heading());
    context.insert("error", &error);
    let page = state.views.render("admin/portfolio_form.html", &context)?;
    Ok((status, page).into_response())
}

fn render_profile_form(
    state: &AppState,
    session: &AdminSession,
    form: &ProfileForm,
    success: Option<String>,
    error: Option<String>,
    status: StatusCode,
) -> Result<Response, PageError> {
    let mut context = admin_context(session);
    context.insert("profile", form);
    context.insert("success", &success);
    context.insert("error", &error);
    let page = state.views.render("admin/profile.html", &context)?;
    Ok((status, page).into_response())
}

/// Store the submitted file, if any. Nothing is written for a rejected file.
async fn store_upload(
    state: &AppState,
    form: &MultipartForm,
) -> Result<Option<StoredUpload>, UploadError> {
    let Some(file) = &form.file else {
        return Ok(None);
    };
    state.uploads.save(file).await.map(Some).map_err(|e| {
        if e.is_rejection() {
            tracing::warn!(file = %file.file_name, error = %e, "upload rejected");
        }
        e
    })
}

async fn discard(state: &AppState, upload: &Option<StoredUpload>) {
    if let Some(upload) = upload {
        state.uploads.discard(upload).await;
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// GET /admin/login
pub async fn login_page(
    State(state): State<AppState>,
    session: Result<AdminSession, AuthRedirect>,
) -> Result<Response, PageError> {
    if session.is_ok() {
        return Ok(Redirect::to(DASHBOARD_PATH).into_response());
    }
    render_login(&state, "", None, StatusCode::OK)
}

/// POST /admin/login
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    if !state.credentials.verify(&form.email, &form.password).await {
        tracing::warn!(email = %form.email, "failed admin login");
        return render_login(&state, &form.email, Some(INVALID_CREDENTIALS), StatusCode::OK);
    }

    match state.sessions.start(&form.email).await {
        Ok(token) => {
            tracing::info!(email = %form.email, "admin logged in");
            let cookie = state.sessions.cookie(&token).to_string();
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to(DASHBOARD_PATH)).into_response())
        }
        Err(e) => {
            tracing::error!("Failed to start admin session: {}", e);
            render_login(
                &state,
                &form.email,
                Some("An error occurred during login"),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// GET /admin/logout
///
/// A session that cannot be destroyed leaves the admin on the dashboard.
pub async fn logout(
    State(state): State<AppState>,
    session: Result<AdminSession, AuthRedirect>,
) -> Response {
    let removal = state.sessions.removal_cookie().to_string();
    let Ok(session) = session else {
        return ([(header::SET_COOKIE, removal)], Redirect::to(LOGIN_PATH)).into_response();
    };

    match state.sessions.end(&session.token).await {
        Ok(()) => {
            tracing::info!(email = %session.email, "admin logged out");
            ([(header::SET_COOKIE, removal)], Redirect::to(LOGIN_PATH)).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to end admin session: {}", e);
            Redirect::to(DASHBOARD_PATH).into_response()
        }
    }
}

// ============================================================================
// Dashboard and portfolios
// ============================================================================

/// GET /admin/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Html<String>, PageError> {
    let portfolio_count = state.portfolios.count().await?;
    let recent = state.portfolios.list_recent(1, RECENT_COUNT).await?;
    let profile = state.profiles.get().await?;

    let mut context = admin_context(&session);
    context.insert("portfolio_count", &portfolio_count);
    context.insert("recent_portfolios", &recent.items);
    context.insert("profile", &profile);
    Ok(state.views.render("admin/dashboard.html", &context)?)
}

/// GET /admin/portfolios
pub async fn list_portfolios(
    State(state): State<AppState>,
    session: AdminSession,
    Query(query): Query<AdminQuery>,
) -> Result<Html<String>, PageError> {
    let page = state.portfolios.list_recent(query.page(), PER_PAGE).await?;

    let mut context = admin_context(&session);
    context.insert("page", &page);
    context.insert("success", &query.success);
    Ok(state.views.render("admin/portfolios.html", &context)?)
}

/// GET /admin/portfolios/new
pub async fn new_portfolio(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Response, PageError> {
    render_portfolio_form(
        &state,
        &session,
        &PortfolioForm::default(),
        FormTarget::New,
        None,
        StatusCode::OK,
    )
}

/// POST /admin/portfolios
pub async fn create_portfolio(
    State(state): State<AppState>,
    session: AdminSession,
    multipart: Multipart,
) -> Result<Response, PageError> {
    let submission = MultipartForm::read(multipart, "image").await?;
    let form = PortfolioForm::from_fields(submission.fields.clone());
    let target = FormTarget::New;

    let mut input = match form.validate() {
        Ok(input) => input,
        Err(e) => {
            return render_portfolio_form(&state, &session, &form, target, Some(e.to_string()), StatusCode::OK)
        }
    };

    let upload = match store_upload(&state, &submission).await {
        Ok(upload) => upload,
        Err(e) if e.is_rejection() => {
            return render_portfolio_form(&state, &session, &form, target, Some(e.to_string()), StatusCode::OK)
        }
        Err(e) => return Err(e.into()),
    };
    input.image_url = upload.as_ref().map(|u| u.public_path.clone());

    match state.portfolios.create(input).await {
        Ok(portfolio) => {
            tracing::info!(id = %portfolio.id, title = %portfolio.title, "portfolio created");
            Ok(Redirect::to("/admin/portfolios?success=Portfolio+created+successfully").into_response())
        }
        Err(e) => {
            tracing::error!("Failed to create portfolio: {}", e);
            discard(&state, &upload).await;
            render_portfolio_form(
                &state,
                &session,
                &form,
                target,
                Some("Failed to create portfolio".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// GET /admin/portfolios/{id}/edit
pub async fn edit_portfolio(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let id = parse_id(&id).ok_or(AppError::NotFound("Portfolio"))?;
    let portfolio = state
        .portfolios
        .get(id)
        .await?
        .ok_or(AppError::NotFound("Portfolio"))?;

    render_portfolio_form(
        &state,
        &session,
        &PortfolioForm::from_portfolio(&portfolio),
        FormTarget::Edit(id),
        None,
        StatusCode::OK,
    )
}

/// PUT /admin/portfolios/{id}, also reachable as POST from plain HTML forms
pub async fn update_portfolio(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, PageError> {
    let id = parse_id(&id).ok_or(AppError::NotFound("Portfolio"))?;
    let existing = state
        .portfolios
        .get(id)
        .await?
        .ok_or(AppError::NotFound("Portfolio"))?;

    let submission = MultipartForm::read(multipart, "image").await?;
    let mut form = PortfolioForm::from_fields(submission.fields.clone());
    form.image_url = existing.image_url;
    let target = FormTarget::Edit(id);

    let mut input = match form.validate() {
        Ok(input) => input,
        Err(e) => {
            return render_portfolio_form(&state, &session, &form, target, Some(e.to_string()), StatusCode::OK)
        }
    };

    let upload = match store_upload(&state, &submission).await {
        Ok(upload) => upload,
        Err(e) if e.is_rejection() => {
            return render_portfolio_form(&state, &session, &form, target, Some(e.to_string()), StatusCode::OK)
        }
        Err(e) => return Err(e.into()),
    };
    input.image_url = upload.as_ref().map(|u| u.public_path.clone());

    match state.portfolios.update(id, input).await {
        Ok(Some(portfolio)) => {
            tracing::info!(id = %portfolio.id, "portfolio updated");
            Ok(Redirect::to("/admin/portfolios?success=Portfolio+updated+successfully").into_response())
        }
        Ok(None) => {
            discard(&state, &upload).await;
            Err(AppError::NotFound("Portfolio").into())
        }
        Err(e) => {
            tracing::error!("Failed to update portfolio {}: {}", id, e);
            discard(&state, &upload).await;
            render_portfolio_form(
                &state,
                &session,
                &form,
                target,
                Some("Failed to update portfolio".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// DELETE /admin/portfolios/{id} - JSON, called from the listing page script
pub async fn delete_portfolio(
    State(state): State<AppState>,
    session: Result<AdminSession, AuthRedirect>,
    Path(id): Path<String>,
) -> Response {
    if let Err(rejection) = session {
        return rejection.into_json();
    }

    let deleted = match parse_id(&id) {
        Some(id) => state.portfolios.delete(id).await,
        None => Ok(false),
    };

    match deleted {
        Ok(true) => {
            tracing::info!(id = %id, "portfolio deleted");
            Json(SuccessResponse {
                success: true,
                message: "Portfolio deleted successfully".to_string(),
            })
            .into_response()
        }
        Ok(false) => ApiError(AppError::NotFound("Portfolio")).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

// ============================================================================
// Profile
// ============================================================================

/// GET /admin/profile
pub async fn profile_page(
    State(state): State<AppState>,
    session: AdminSession,
    Query(query): Query<AdminQuery>,
) -> Result<Response, PageError> {
    let profile = state.profiles.get_or_create().await?;
    render_profile_form(
        &state,
        &session,
        &ProfileForm::from_profile(&profile),
        query.success,
        None,
        StatusCode::OK,
    )
}

/// POST /admin/profile
pub async fn update_profile(
    State(state): State<AppState>,
    session: AdminSession,
    multipart: Multipart,
) -> Result<Response, PageError> {
    let submission = MultipartForm::read(multipart, "avatar").await?;
    let mut form = ProfileForm::from_fields(submission.fields.clone());
    if let Some(current) = state.profiles.get().await? {
        form.avatar = current.avatar;
    }

    let mut input = match form.validate() {
        Ok(input) => input,
        Err(e) => {
            return render_profile_form(&state, &session, &form, None, Some(e.to_string()), StatusCode::OK)
        }
    };

    let upload = match store_upload(&state, &submission).await {
        Ok(upload) => upload,
        Err(e) if e.is_rejection() => {
            return render_profile_form(&state, &session, &form, None, Some(e.to_string()), StatusCode::OK)
        }
        Err(e) => return Err(e.into()),
    };
    input.avatar = upload.as_ref().map(|u| u.public_path.clone());

    match state.profiles.upsert(input).await {
        Ok(_) => {
            tracing::info!("profile updated");
            Ok(Redirect::to("/admin/profile?success=Profile+updated+successfully").into_response())
        }
        Err(e) => {
            tracing::error!("Failed to update profile: {}", e);
            discard(&state, &upload).await;
            render_profile_form(
                &state,
                &session,
                &form,
                None,
                Some("Failed to update profile".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}
