//! Host-side data sources for the metrics snapshot.
//!
//! `HostSource` is the seam to the operating system. Every method may fail
//! by returning `None` (or an empty table); the snapshot builder turns that
//! into zeroed fields instead of an error.

pub mod processes;
pub mod procfs_text;

use std::fs;
use std::path::PathBuf;

use log::debug;
use sysinfo::{Disks, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

pub use processes::{ProcessClassifier, ProcessRule, RawProcess};

/// Bytes on the monitored filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskSpace {
    pub total: u64,
    pub available: u64,
}

pub trait HostSource: Send {
    /// Raw `/proc/stat` text.
    fn cpu_stat(&mut self) -> Option<String>;

    /// Raw `/proc/meminfo` text.
    fn meminfo(&mut self) -> Option<String>;

    fn disk(&mut self) -> Option<DiskSpace>;

    fn process_table(&mut self) -> Vec<RawProcess>;
}

/// Linux host: procfs text files plus `sysinfo` for disks and processes.
pub struct LinuxHost {
    system: System,
    disks: Disks,
    disk_mount: PathBuf,
}

impl LinuxHost {
    pub fn new(disk_mount: impl Into<PathBuf>) -> Self {
        Self {
            system: System::new(),
            disks: Disks::new_with_refreshed_list(),
            disk_mount: disk_mount.into(),
        }
    }
}

fn read_proc_file(path: &str) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) => {
            debug!("[snapshot] failed to read {path}: {err}");
            None
        }
    }
}

impl HostSource for LinuxHost {
    fn cpu_stat(&mut self) -> Option<String> {
        read_proc_file(&procfs_text::stat_path())
    }

    fn meminfo(&mut self) -> Option<String> {
        read_proc_file(&procfs_text::meminfo_path())
    }

    fn disk(&mut self) -> Option<DiskSpace> {
        self.disks.refresh(true);
        let disk = self
            .disks
            .list()
            .iter()
            .find(|d| d.mount_point() == self.disk_mount.as_path());
        if disk.is_none() {
            debug!(
                "[snapshot] no filesystem mounted at {}",
                self.disk_mount.display()
            );
        }
        disk.map(|d| DiskSpace {
            total: d.total_space(),
            available: d.available_space(),
        })
    }

    fn process_table(&mut self) -> Vec<RawProcess> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cmd(UpdateKind::OnlyIfNotSet),
        );

        let mut table: Vec<RawProcess> = self
            .system
            .processes()
            .values()
            .map(|p| RawProcess {
                pid: p.pid().as_u32(),
                comm: p.name().to_string_lossy().into_owned(),
                cmdline: p
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" "),
            })
            .collect();
        table.sort_by_key(|p| p.pid);
        table
    }
}
