use log::debug;

use crate::collectors::procfs_text::{self, CpuTimes};
use crate::collectors::{HostSource, ProcessClassifier};
use crate::types::{CpuUsage, MetricsSnapshot, SpaceUsage};

/// Composes the host collaborators into a `MetricsSnapshot`.
///
/// The only state carried between builds is the previous CPU counter sample,
/// needed to turn cumulative jiffies into percentages.
pub struct SnapshotBuilder {
    source: Box<dyn HostSource>,
    classifier: ProcessClassifier,
    prev_cpu: Option<CpuTimes>,
}

impl SnapshotBuilder {
    pub fn new(source: Box<dyn HostSource>, classifier: ProcessClassifier) -> Self {
        Self {
            source,
            classifier,
            prev_cpu: None,
        }
    }

    pub fn build(&mut self) -> MetricsSnapshot {
        MetricsSnapshot {
            cpu: self.cpu(),
            memory: self.memory(),
            disk: self.disk(),
            processes: self.classifier.classify(&self.source.process_table()),
        }
    }

    fn cpu(&mut self) -> CpuUsage {
        let Some(times) = self
            .source
            .cpu_stat()
            .and_then(|stat| procfs_text::parse_cpu_times(&stat))
        else {
            debug!("[snapshot] cpu counters unavailable");
            return CpuUsage::default();
        };
        let usage = procfs_text::cpu_usage(&times, self.prev_cpu.as_ref());
        self.prev_cpu = Some(times);
        usage
    }

    fn memory(&mut self) -> SpaceUsage {
        self.source
            .meminfo()
            .map(|content| procfs_text::memory_usage(&content))
            .unwrap_or_default()
    }

    fn disk(&mut self) -> SpaceUsage {
        self.source
            .disk()
            .map(|d| {
                let used = d.total.saturating_sub(d.available);
                SpaceUsage::from_bytes(d.total, used, d.available)
            })
            .unwrap_or_default()
    }
}
