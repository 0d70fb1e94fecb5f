//! Parsers for the textual `/proc` files behind the CPU and memory metrics.
//!
//! `/proc/stat` first line, cumulative jiffies since boot:
//!   cpu  user nice system idle iowait irq softirq steal guest guest_nice
//!
//! `/proc/meminfo`, one counter per line in kB:
//!   MemTotal:       16318888 kB
//!   MemFree:         1287716 kB
//!   MemAvailable:    9467140 kB
//!
//! Every parser is total: missing or garbled fields read as zero so a single
//! bad counter never takes the whole snapshot down.

use std::collections::HashMap;
use std::env;

use crate::types::{CpuUsage, SpaceUsage, round2};

pub(crate) fn proc_path(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

pub fn stat_path() -> String {
    proc_path("DEVMON_PROC_STAT_PATH", "/proc/stat")
}

pub fn meminfo_path() -> String {
    proc_path("DEVMON_MEMINFO_PATH", "/proc/meminfo")
}

/// Aggregate CPU counters from the `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    fn total(&self) -> u64 {
        self.busy() + self.idle + self.iowait + self.irq + self.softirq + self.steal
    }

    fn busy(&self) -> u64 {
        self.user + self.nice + self.system
    }

    fn since(&self, earlier: &CpuTimes) -> CpuTimes {
        CpuTimes {
            user: self.user.saturating_sub(earlier.user),
            nice: self.nice.saturating_sub(earlier.nice),
            system: self.system.saturating_sub(earlier.system),
            idle: self.idle.saturating_sub(earlier.idle),
            iowait: self.iowait.saturating_sub(earlier.iowait),
            irq: self.irq.saturating_sub(earlier.irq),
            softirq: self.softirq.saturating_sub(earlier.softirq),
            steal: self.steal.saturating_sub(earlier.steal),
        }
    }
}

/// Returns `None` when the aggregate `cpu` line is absent.
pub fn parse_cpu_times(content: &str) -> Option<CpuTimes> {
    let line = content
        .lines()
        .find(|line| line.split_whitespace().next() == Some("cpu"))?;

    let mut fields = line
        .split_whitespace()
        .skip(1)
        .map(|v| v.parse::<u64>().unwrap_or(0));
    let mut next = || fields.next().unwrap_or(0);

    Some(CpuTimes {
        user: next(),
        nice: next(),
        system: next(),
        idle: next(),
        iowait: next(),
        irq: next(),
        softirq: next(),
        steal: next(),
    })
}

/// Percentages over the interval between two samples, like `top` reports
/// them. With no previous sample the counters since boot are used.
///
/// iowait, irq and steal count towards neither side, so `used + idle` can
/// fall short of 100.
pub fn cpu_usage(current: &CpuTimes, previous: Option<&CpuTimes>) -> CpuUsage {
    let delta = match previous {
        Some(prev) => current.since(prev),
        None => *current,
    };
    let total = delta.total();
    if total == 0 {
        return CpuUsage::default();
    }
    let pct = |v: u64| round2(v as f64 * 100.0 / total as f64);
    CpuUsage {
        capacity: 100.0,
        used: pct(delta.busy()),
        idle: pct(delta.idle),
    }
}

pub fn parse_meminfo(content: &str) -> HashMap<String, u64> {
    content
        .lines()
        .filter_map(|line| {
            let (key, rest) = line.split_once(':')?;
            let kb = rest.split_whitespace().next()?.parse::<u64>().ok()?;
            Some((key.trim().to_string(), kb))
        })
        .collect()
}

/// `total` is MemTotal, `used` is what is not available for new
/// allocations, `free` is truly unused memory. Page cache sits between
/// `used` and `free`.
pub fn memory_usage(content: &str) -> SpaceUsage {
    let info = parse_meminfo(content);
    let kb = |key: &str| info.get(key).copied().unwrap_or(0);

    let total = kb("MemTotal");
    let free = kb("MemFree");
    let available = info
        .get("MemAvailable")
        .copied()
        .unwrap_or_else(|| free + kb("Buffers") + kb("Cached"));
    let used = total.saturating_sub(available);

    SpaceUsage::from_bytes(total * 1024, used * 1024, free * 1024)
}
