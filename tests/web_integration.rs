//! Integration tests for the web form.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use critical_agent::analyzer::{Analyzer, ServiceError, TextGenerator};
use critical_agent::runner::Runner;
use critical_agent::web::{router, AppState};

struct Fixed;

#[async_trait]
impl TextGenerator for Fixed {
    async fn generate(&self, _system: &str, _user: &str) -> Result<String, ServiceError> {
        Ok("1. **SQL Injection**\n2. Linha 5\n3. Crítica".to_string())
    }
}

/// Quotes the offending markup back, as models tend to.
struct Quoting;

#[async_trait]
impl TextGenerator for Quoting {
    async fn generate(&self, _system: &str, _user: &str) -> Result<String, ServiceError> {
        Ok("1. XSS\n2. Linha 1: <script>alert(document.cookie)</script>\n3. Alta".to_string())
    }
}

fn app(projects_root: Option<&std::path::Path>) -> axum::Router {
    app_with(Arc::new(Fixed), projects_root)
}

fn app_with(
    generator: Arc<dyn TextGenerator>,
    projects_root: Option<&std::path::Path>,
) -> axum::Router {
    let runner = Runner::new(Analyzer::new(generator))
        .projects_root(projects_root.map(|p| p.to_path_buf()));
    router(AppState::new(runner).expect("templates should load"))
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_get_renders_empty_form() {
    let response = app(None)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("name=\"project_path\""));
    assert!(!html.contains("class=\"error\""));
}

#[tokio::test]
async fn test_post_unknown_project_renders_error() {
    let root = TempDir::new().unwrap();
    let response = app(Some(root.path()))
        .oneshot(post_form("project_path=ghost-project-5d0c"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("Project not found: ghost-project-5d0c"));
}

#[tokio::test]
async fn test_post_empty_project_renders_error() {
    let response = app(None).oneshot(post_form("project_path=")).await.unwrap();
    let html = body_text(response).await;
    assert!(html.contains("Project not found: "));
}

#[tokio::test]
async fn test_post_project_without_matching_files() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir(root.path().join("docs")).unwrap();
    std::fs::write(root.path().join("docs/notes.txt"), "nothing").unwrap();

    let response = app(Some(root.path()))
        .oneshot(post_form("project_path=docs"))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("No matching files found in:"));
}

#[tokio::test]
async fn test_post_renders_report() {
    let root = TempDir::new().unwrap();
    let project = root.path().join("shop");
    std::fs::create_dir_all(project.join("admin")).unwrap();
    std::fs::write(project.join("index.php"), "<?php echo $_GET['q']; ?>").unwrap();
    std::fs::write(project.join("admin/login.php"), "<?php $u = $_POST['u']; ?>").unwrap();
    std::fs::write(project.join("notes.txt"), "ignored").unwrap();

    let response = app(Some(root.path()))
        .oneshot(post_form("project_path=shop"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<h1>Security Analysis Report</h1>"));
    assert!(html.contains(&format!(
        "<h2>File: <code>{}</code></h2>",
        project.join("index.php").display()
    )));
    assert!(html.contains(&format!(
        "<h2>File: <code>{}</code></h2>",
        project.join("admin/login.php").display()
    )));
    assert!(!html.contains("notes.txt"));
    assert!(html.contains("<strong>SQL Injection</strong>"));
    assert!(html.contains("2 file(s) analyzed"));
}

#[tokio::test]
async fn test_post_escapes_markup_in_model_reply() {
    let root = TempDir::new().unwrap();
    let project = root.path().join("blog");
    std::fs::create_dir(&project).unwrap();
    std::fs::write(project.join("post.php"), "<?php echo $_GET['c']; ?>").unwrap();

    let response = app_with(Arc::new(Quoting), Some(root.path()))
        .oneshot(post_form("project_path=blog"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(!html.contains("<script>alert"));
    assert!(html.contains("&lt;script&gt;alert(document.cookie)&lt;/script&gt;"));
}

#[tokio::test]
async fn test_health() {
    let response = app(None)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}
