//! The process-wide monitor context.
//!
//! One `Monitor` is built at startup and shared as `Arc<Monitor>` with the
//! scheduler and every connection task. It owns the query log, the
//! subscriber set, the snapshot builder and the debug-session gate.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use log::{debug, info};

use crate::collectors::{HostSource, LinuxHost, ProcessClassifier};
use crate::config::Config;
use crate::debug_session::{self, DebugSessionDetector};
use crate::hub::{BroadcastHub, SubscriberId};
use crate::queries::{CallSiteCleaner, QueryEvent, QueryEventSink, QueryLog, QueryRecord};
use crate::snapshot::SnapshotBuilder;
use crate::types::{FullState, MetricsSnapshot, QueryNotice};

/// What a broadcast attempt ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broadcast {
    Sent(usize),
    SuppressedByDebugger,
}

pub struct Monitor {
    snapshots: Mutex<SnapshotBuilder>,
    queries: QueryEventSink,
    detector: Box<dyn DebugSessionDetector>,
    hub: BroadcastHub,
}

impl Monitor {
    /// Monitor for this host as described by `cfg`.
    pub fn from_config(cfg: &Config) -> Result<Arc<Self>> {
        let host = LinuxHost::new(&cfg.sampling.disk_mount);
        Ok(Arc::new(Self::with_parts(
            cfg,
            Box::new(host),
            debug_session::from_config(&cfg.debug),
        )?))
    }

    /// Monitor with explicit collaborators; the rest comes from `cfg`.
    pub fn with_parts(
        cfg: &Config,
        host: Box<dyn HostSource>,
        detector: Box<dyn DebugSessionDetector>,
    ) -> Result<Self> {
        let classifier = ProcessClassifier::from_config(&cfg.processes)?;
        let cleaner = CallSiteCleaner::new(
            cfg.queries.app_root.clone(),
            cfg.queries.frame_silencers.clone(),
        );
        let query_log = QueryLog::new(cfg.queries.capacity);
        info!("[queries] keeping the last {} queries", query_log.capacity());
        Ok(Self {
            snapshots: Mutex::new(SnapshotBuilder::new(host, classifier)),
            queries: QueryEventSink::new(query_log, cleaner),
            detector,
            hub: BroadcastHub::new(cfg.server.queue_depth),
        })
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub fn query_log(&self) -> &QueryLog {
        self.queries.log()
    }

    pub fn debugging(&self) -> bool {
        self.detector.active()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .build()
    }

    pub fn full_state(&self) -> FullState {
        FullState {
            metrics: self.metrics(),
            query_log: self.query_log().records(),
        }
    }

    /// One scheduler tick: sample the host and push the metrics, unless a
    /// debug session is active, in which case nothing is sampled or sent.
    pub fn publish_metrics(&self) -> Broadcast {
        if self.debugging() {
            debug!("[scheduler] debug session active; skipping tick");
            return Broadcast::SuppressedByDebugger;
        }
        Broadcast::Sent(self.hub.notify_json(&self.metrics()))
    }

    /// Records the query and announces it. The log is updated even while a
    /// debug session holds back the announcement.
    pub fn on_query_event(&self, event: &QueryEvent) -> Option<QueryRecord> {
        let record = self.queries.on_query_event(event)?;
        if self.debugging() {
            debug!("[queries] debug session active; not announcing query");
        } else {
            self.hub.notify_json(&QueryNotice {
                sql_query: &record,
            });
        }
        Some(record)
    }

    /// Any inbound message is a pull request. The combined state goes to
    /// every subscriber so all viewers stay in step, not only the sender.
    pub fn on_client_message(&self, from: SubscriberId, message: &str) -> Broadcast {
        debug!("[hub] pull request from subscriber {from}: {message:.64}");
        if self.debugging() {
            info!("[hub] debug session active; skipping state push");
            return Broadcast::SuppressedByDebugger;
        }
        let sent = self.hub.notify_json(&self.full_state());
        debug!("[hub] sent monitor state to {sent} subscribers");
        Broadcast::Sent(sent)
    }
}
