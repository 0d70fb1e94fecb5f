/// Embedded dashboard page.
///
/// Plain requests get this page; it then opens the push channel at `/ws`
/// and renders whatever the daemon sends.
use axum::response::{Html, IntoResponse};

const DASHBOARD_HTML: &str = include_str!("dashboard.html");

pub async fn dashboard_handler() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}
