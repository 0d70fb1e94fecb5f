//! Capture of database query-execution events.
//!
//! The instrumentation collaborator hands over one `QueryEvent` per executed
//! statement. `QueryEventSink` scores it, drops exact duplicates and keeps
//! the last `capacity` records in a `QueryLog`.

pub mod analyzer;
pub mod call_site;
pub mod store;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::types::round2;

pub use self::analyzer::analyze;
pub use self::call_site::CallSiteCleaner;
pub use self::store::QueryLog;

/// Extra data attached to a query notification. Both keys may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryPayload {
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub cached: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryEvent {
    #[serde(default)]
    pub name: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    #[serde(default)]
    pub payload: QueryPayload,
    /// Raw frames of the issuing thread, innermost first.
    #[serde(default)]
    pub backtrace: Vec<String>,
}

/// One captured query. Immutable once built; lives only inside the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub timestamp: String, // HH:MM:SS.mmm
    #[serde(rename = "duration")]
    pub duration_ms: f64,
    #[serde(rename = "sql")]
    pub sql_text: String,
    pub cached: bool,
    #[serde(rename = "location")]
    pub call_site: String,
    pub warning: bool,
    pub message: String,
}

pub fn duration_ms(started_at: &DateTime<Local>, finished_at: &DateTime<Local>) -> f64 {
    let elapsed = finished_at.signed_duration_since(*started_at);
    let micros = elapsed.num_microseconds().unwrap_or(i64::MAX);
    round2((micros.max(0) as f64) / 1000.0)
}

pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%H:%M:%S%.3f").to_string()
}

pub struct QueryEventSink {
    log: QueryLog,
    cleaner: CallSiteCleaner,
}

impl QueryEventSink {
    pub fn new(log: QueryLog, cleaner: CallSiteCleaner) -> Self {
        Self { log, cleaner }
    }

    pub fn log(&self) -> &QueryLog {
        &self.log
    }

    pub fn to_record(&self, event: &QueryEvent) -> QueryRecord {
        let sql_text = event.payload.sql.clone().unwrap_or_default();
        let (warning, message) = analyze(&sql_text);
        QueryRecord {
            timestamp: format_timestamp(&event.started_at),
            duration_ms: duration_ms(&event.started_at, &event.finished_at),
            sql_text,
            cached: event.payload.cached.unwrap_or(false),
            call_site: self.cleaner.resolve(&event.backtrace),
            warning,
            message,
        }
    }

    /// Returns the record when it was appended, `None` for a duplicate.
    pub fn on_query_event(&self, event: &QueryEvent) -> Option<QueryRecord> {
        let record = self.to_record(event);
        self.log.insert(record.clone()).then_some(record)
    }
}
