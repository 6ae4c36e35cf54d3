//! HTML rendering. Templates are compiled into the binary.

use axum::{http::StatusCode, response::Html};
use tera::{Context, Tera};

use crate::error::{AppError, ErrorReport};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("portfolio_detail.html", include_str!("../templates/portfolio_detail.html")),
    ("category.html", include_str!("../templates/category.html")),
    ("about.html", include_str!("../templates/about.html")),
    ("contact.html", include_str!("../templates/contact.html")),
    ("404.html", include_str!("../templates/404.html")),
    ("error.html", include_str!("../templates/error.html")),
    ("admin/base.html", include_str!("../templates/admin/base.html")),
    ("admin/login.html", include_str!("../templates/admin/login.html")),
    ("admin/dashboard.html", include_str!("../templates/admin/dashboard.html")),
    ("admin/portfolios.html", include_str!("../templates/admin/portfolios.html")),
    ("admin/portfolio_form.html", include_str!("../templates/admin/portfolio_form.html")),
    ("admin/profile.html", include_str!("../templates/admin/profile.html")),
    ("admin/error.html", include_str!("../templates/admin/error.html")),
];

pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>, AppError> {
        Ok(Html(self.tera.render(name, context)?))
    }

    pub fn error_page(
        &self,
        report: &ErrorReport,
        detail: Option<&str>,
        admin: bool,
    ) -> Result<Html<String>, tera::Error> {
        let template = match (admin, report.status) {
            (true, _) => "admin/error.html",
            (false, StatusCode::NOT_FOUND) => "404.html",
            (false, _) => "error.html",
        };

        let mut context = Context::new();
        context.insert("title", &report.message);
        context.insert("status", &report.status.as_u16());
        context.insert("message", &report.message);
        context.insert("detail", &detail);
        self.tera.render(template, &context).map(Html)
    }
}
