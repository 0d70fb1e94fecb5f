use colored::*;
use reqwest::Client;
use serde_json::json;
use std::error::Error;

use crate::state::{QueryRecord, fetch_state};

pub async fn run_queries(
    client: &Client,
    url: &str,
    warnings_only: bool,
    color: bool,
) -> Result<(), Box<dyn Error>> {
    let state = fetch_state(client, url).await?;
    let shown: Vec<&QueryRecord> = state
        .sql_queries
        .iter()
        .filter(|q| !warnings_only || q.warning)
        .collect();

    if shown.is_empty() {
        println!("{}", "(no queries captured)".dimmed());
        return Ok(());
    }

    for q in shown {
        println!("{}", format_query(q, color));
    }
    Ok(())
}

pub fn format_query(q: &QueryRecord, color: bool) -> String {
    let cached = if q.cached { " CACHE" } else { "" };
    let mut line = format!("{} {:>9.2}ms{} {}", q.timestamp, q.duration, cached, q.sql);
    if !q.location.is_empty() {
        line.push_str(&format!("\n    ↳ {}", q.location));
    }
    if q.warning {
        let note = format!("\n    ⚠ {}", q.message);
        if color {
            line.push_str(&note.yellow().to_string());
        } else {
            line.push_str(&note);
        }
    }
    line
}

/// Posts a synthetic query event, as an instrumented application would.
pub async fn run_emit(
    client: &Client,
    url: &str,
    sql: &str,
    duration_ms: f64,
    cached: bool,
) -> Result<(), Box<dyn Error>> {
    let finished_at = chrono::Local::now();
    let started_at = finished_at - chrono::Duration::microseconds((duration_ms * 1000.0) as i64);
    let event = json!({
        "name": "sql.devmon_cli",
        "started_at": started_at.to_rfc3339(),
        "finished_at": finished_at.to_rfc3339(),
        "payload": { "sql": sql, "cached": cached },
        "backtrace": ["devmon-cli emit"],
    });

    let resp = client
        .post(format!("{}/queries", url))
        .json(&event)
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(format!("daemon rejected event: {}", resp.status()).into());
    }
    let body: serde_json::Value = resp.json().await?;
    let recorded = body["recorded"].as_bool().unwrap_or(false);
    let warning = body["warning"].as_bool().unwrap_or(false);
    match (recorded, warning) {
        (true, true) => println!("recorded (flagged: possible N+1)"),
        (true, false) => println!("recorded"),
        (false, _) => println!("duplicate, not recorded"),
    }
    Ok(())
}
