use reqwest::Client;
use serde::Deserialize;
use std::error::Error;

#[derive(Debug, Deserialize, Default)]
pub struct CpuUsage {
    #[allow(dead_code)]
    pub capacity: f64,
    pub used: f64,
    pub idle: f64,
}

#[derive(Debug, Deserialize, Default)]
pub struct SpaceUsage {
    pub total: f64,
    pub used: f64,
    pub free: f64,
}

#[derive(Debug, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub comm: String,
    pub cmdline: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRecord {
    pub timestamp: String,
    pub duration: f64,
    pub sql: String,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub warning: bool,
    #[serde(default)]
    pub message: String,
}

/// Body of the daemon's `/snapshot` endpoint.
#[derive(Debug, Deserialize)]
pub struct FullState {
    #[serde(default)]
    pub cpu_usage: CpuUsage,
    #[serde(default)]
    pub memory_usage: SpaceUsage,
    #[serde(default)]
    pub disk_usage: SpaceUsage,
    #[serde(default)]
    pub process_info: Vec<ProcessInfo>,
    #[serde(default)]
    pub sql_queries: Vec<QueryRecord>,
}

pub async fn fetch_state(client: &Client, url: &str) -> Result<FullState, Box<dyn Error>> {
    let resp = client.get(format!("{}/snapshot", url)).send().await?;
    if !resp.status().is_success() {
        return Err(format!("daemon returned {}", resp.status()).into());
    }
    Ok(resp.json().await?)
}

pub fn print_metrics(state: &FullState) {
    println!(
        "cpu {:>6.2}% used {:>6.2}% idle | mem {:.2}/{:.2} GB ({:.2} free) | disk {:.2}/{:.2} GB ({:.2} free)",
        state.cpu_usage.used,
        state.cpu_usage.idle,
        state.memory_usage.used,
        state.memory_usage.total,
        state.memory_usage.free,
        state.disk_usage.used,
        state.disk_usage.total,
        state.disk_usage.free,
    );
}
