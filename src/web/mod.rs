//! Single-page web front end.
//!
//! `GET /` renders the form, `POST /` runs the scan pipeline inside the
//! request and renders the report. A scan holds its request for the sum of
//! all per-file analysis latencies.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tera::{Context, Tera};
use tower_http::trace::TraceLayer;

use crate::report;
use crate::runner::{RunError, Runner};

const TPL_BASE: &str = include_str!("templates/base.html");
const TPL_INDEX: &str = include_str!("templates/index.html");
const TPL_REPORT: &str = include_str!("templates/report.html");

/// Shared state for the handlers.
#[derive(Clone)]
pub struct AppState {
    runner: Runner,
    templates: Arc<Tera>,
}

impl AppState {
    pub fn new(runner: Runner) -> Result<Self, tera::Error> {
        Ok(Self {
            runner,
            templates: Arc::new(templates()?),
        })
    }
}

/// Load the embedded page templates.
pub fn templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template("base.html", TPL_BASE)?;
    tera.add_raw_template("index.html", TPL_INDEX)?;
    tera.add_raw_template("report.html", TPL_REPORT)?;
    Ok(tera)
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler).post(scan_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ScanForm {
    #[serde(default)]
    pub project_path: String,
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn index_handler(State(state): State<AppState>) -> Response {
    render_form(&state.templates, None, "")
}

async fn scan_handler(State(state): State<AppState>, Form(form): Form<ScanForm>) -> Response {
    let input = form.project_path.trim();

    // Resolution and the directory walk are blocking filesystem work.
    let planned = {
        let runner = state.runner.clone();
        let owned = input.to_string();
        tokio::task::spawn_blocking(move || runner.plan(&owned)).await
    };
    let planned = match planned {
        Ok(planned) => planned,
        Err(e) => {
            tracing::error!(error = %e, "scan planning task failed");
            return render_form(&state.templates, Some("Internal error while scanning"), input);
        }
    };

    let plan = match planned {
        Ok(plan) => plan,
        Err(RunError::Resolve(e)) => {
            tracing::info!(input, error = %e, "project not found");
            let msg = format!("Project not found: {}", input);
            return render_form(&state.templates, Some(&msg), input);
        }
        Err(e) => return render_form(&state.templates, Some(&e.to_string()), input),
    };

    let results = state.runner.analyze_files(&plan.files, |_, _| {}).await;
    let report_html = report::render_html(&report::assemble(&results));
    tracing::info!(files = results.len(), failures = results.failures(), "report generated");

    let mut context = Context::new();
    context.insert("project", input);
    context.insert("report", &report_html);
    context.insert("files_scanned", &results.len());
    context.insert("failures", &results.failures());
    render_template(&state.templates, "report.html", &context)
}

fn render_form(tera: &Tera, error: Option<&str>, project: &str) -> Response {
    let mut context = Context::new();
    context.insert("error", &error);
    context.insert("project", project);
    render_template(tera, "index.html", &context)
}

fn render_template(tera: &Tera, name: &str, context: &Context) -> Response {
    match tera.render(name, context) {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            tracing::error!("Template error: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Template error: {}", err),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_load() {
        let tera = templates().unwrap();
        let names: Vec<_> = tera.get_template_names().collect();
        for expected in ["base.html", "index.html", "report.html"] {
            assert!(names.contains(&expected), "missing template {}", expected);
        }
    }

    #[test]
    fn test_form_escapes_error() {
        let tera = templates().unwrap();
        let mut context = Context::new();
        context.insert("error", &Some("Project not found: <script>alert(1)</script>"));
        context.insert("project", "<script>alert(1)</script>");
        let html = tera.render("index.html", &context).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_report_inserts_html_unescaped() {
        let tera = templates().unwrap();
        let mut context = Context::new();
        context.insert("project", "shop");
        context.insert("report", "<h1>Security Analysis Report</h1>");
        context.insert("files_scanned", &1usize);
        context.insert("failures", &0usize);
        let html = tera.render("report.html", &context).unwrap();
        assert!(html.contains("<h1>Security Analysis Report</h1>"));
        assert!(html.contains("1 file(s) analyzed"));
        assert!(!html.contains("failed"));
    }
}
