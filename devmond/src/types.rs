use serde::{Deserialize, Serialize};

use crate::queries::QueryRecord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuUsage {
    pub capacity: f64,
    pub used: f64, // % of all CPU time spent in user + nice + system
    pub idle: f64, // % of all CPU time idle
}

impl Default for CpuUsage {
    fn default() -> Self {
        Self {
            capacity: 100.0,
            used: 0.0,
            idle: 0.0,
        }
    }
}

/// Gigabytes, rounded to two decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceUsage {
    #[serde(rename = "total")]
    pub total_gb: f64,
    #[serde(rename = "used")]
    pub used_gb: f64,
    #[serde(rename = "free")]
    pub free_gb: f64,
}

impl SpaceUsage {
    pub fn from_bytes(total: u64, used: u64, free: u64) -> Self {
        Self {
            total_gb: to_gb(total),
            used_gb: to_gb(used),
            free_gb: to_gb(free),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    #[serde(rename = "comm")]
    pub command_name: String,
    #[serde(rename = "cmdline")]
    pub full_cmdline: String,
    pub description: String,
}

/// One point-in-time aggregation of host resources. Rebuilt on every sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    #[serde(rename = "cpu_usage")]
    pub cpu: CpuUsage,
    #[serde(rename = "memory_usage")]
    pub memory: SpaceUsage,
    #[serde(rename = "disk_usage")]
    pub disk: SpaceUsage,
    #[serde(rename = "process_info")]
    pub processes: Vec<ProcessInfo>,
}

/// Metrics plus the query log, sent in reply to a subscriber's pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullState {
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
    #[serde(rename = "sql_queries")]
    pub query_log: Vec<QueryRecord>,
}

/// Push payload announcing a newly captured query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryNotice<'a> {
    pub sql_query: &'a QueryRecord,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn to_gb(bytes: u64) -> f64 {
    round2(bytes as f64 / 1024.0 / 1024.0 / 1024.0)
}
