//! Detects a human paused at a breakpoint so broadcasts can hold off.
//!
//! This is a cooperative signal only. Sampling and query capture keep
//! running; just the outbound pushes are suppressed while it reports true.

use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use procfs::process::Process;

use crate::config::DebugConfig;

pub trait DebugSessionDetector: Send + Sync {
    fn active(&self) -> bool;
}

/// Looks at every thread of the target process for a ptrace tracer whose
/// command name is a known interactive debugger.
pub struct TracerDetector {
    pid: Option<i32>,
    debuggers: Vec<String>,
}

impl TracerDetector {
    /// `pid = None` watches the current process.
    pub fn new(pid: Option<i32>, debuggers: Vec<String>) -> Self {
        Self { pid, debuggers }
    }

    fn target(&self) -> procfs::ProcResult<Process> {
        match self.pid {
            Some(pid) => Process::new(pid),
            None => Process::myself(),
        }
    }

    fn tracer_pids(&self) -> procfs::ProcResult<Vec<i32>> {
        let mut tracers: Vec<i32> = self
            .target()?
            .tasks()?
            .filter_map(|task| task.ok())
            .filter_map(|task| task.status().ok())
            .map(|status| status.tracerpid)
            .filter(|pid| *pid > 0)
            .collect();
        tracers.sort_unstable();
        tracers.dedup();
        Ok(tracers)
    }
}

impl DebugSessionDetector for TracerDetector {
    fn active(&self) -> bool {
        let tracers = match self.tracer_pids() {
            Ok(tracers) => tracers,
            Err(err) => {
                debug!("[debug] cannot inspect threads: {err}");
                return false;
            }
        };
        tracers.into_iter().any(|pid| {
            Process::new(pid)
                .and_then(|p| p.stat())
                .map(|stat| is_debugger(&stat.comm, &self.debuggers))
                .unwrap_or(false)
        })
    }
}

/// True when `comm` names one of the debuggers, e.g. `gdb`, `rust-lldb` or
/// `lldb-server` for `lldb`.
pub fn is_debugger(comm: &str, debuggers: &[String]) -> bool {
    let comm = comm.trim();
    debuggers.iter().any(|name| {
        comm == name
            || comm
                .split(['-', '.', '_'])
                .any(|part| part == name.as_str())
    })
}

/// Manually flipped detector, for embedders that know about their own
/// stepping state and for tests.
#[derive(Debug, Default)]
pub struct FlagDetector {
    flag: AtomicBool,
}

impl FlagDetector {
    pub fn new(active: bool) -> Self {
        Self {
            flag: AtomicBool::new(active),
        }
    }

    pub fn set(&self, active: bool) {
        self.flag.store(active, Ordering::SeqCst);
    }
}

impl DebugSessionDetector for FlagDetector {
    fn active(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl<T: DebugSessionDetector + ?Sized> DebugSessionDetector for std::sync::Arc<T> {
    fn active(&self) -> bool {
        (**self).active()
    }
}

/// Active when any inner detector is.
pub struct AnyDetector(pub Vec<Box<dyn DebugSessionDetector>>);

impl DebugSessionDetector for AnyDetector {
    fn active(&self) -> bool {
        self.0.iter().any(|d| d.active())
    }
}

/// Watches the daemon itself and, when `target_pid` is set, the
/// instrumented application posting its queries from another process.
pub fn from_config(cfg: &DebugConfig) -> Box<dyn DebugSessionDetector> {
    let own = TracerDetector::new(None, cfg.debuggers.clone());
    match cfg.target_pid {
        None => Box::new(own),
        Some(pid) => {
            debug!("[debug] watching pid {pid} for debugger sessions");
            Box::new(AnyDetector(vec![
                Box::new(TracerDetector::new(Some(pid), cfg.debuggers.clone())),
                Box::new(own),
            ]))
        }
    }
}
