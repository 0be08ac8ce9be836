//! Persisted workload records.

use std::fmt;

use chrono::{DateTime, Utc};
use rustix::io::Errno;
use rustix::process::{Pid, test_kill_process};
use serde::{Deserialize, Serialize};

use cglimit_common::{CgError, CgPaths, CgResult, WorkloadId};

use crate::cgroup::ResourceLimitSpec;

/// Lifecycle state of a workload as last recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadStatus {
    /// The workload's process is running.
    Running,
    /// The workload has exited.
    Stopped,
}

impl fmt::Display for WorkloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Desired resource limits stored with a workload.
///
/// Zero or empty means "not configured", as in [`ResourceLimitSpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredResources {
    /// Hard memory limit in bytes.
    pub memory: u64,
    /// Soft memory limit in bytes.
    pub memory_reservation: u64,
    /// Memory plus swap limit in bytes.
    pub memory_swap: i64,
    /// Relative CPU weight.
    pub cpu_shares: u64,
    /// CFS quota in microseconds.
    pub cpu_quota: i64,
    /// CFS period in microseconds.
    pub cpu_period: u64,
    /// CPU pinning mask.
    pub cpuset: String,
}

impl StoredResources {
    /// Take over every field that is set in `spec`, keeping the rest.
    pub fn merge(&mut self, spec: &ResourceLimitSpec) {
        if spec.memory != 0 {
            self.memory = spec.memory;
        }
        if spec.memory_reservation != 0 {
            self.memory_reservation = spec.memory_reservation;
        }
        if spec.memory_swap != 0 {
            self.memory_swap = spec.memory_swap;
        }
        if spec.cpu_shares != 0 {
            self.cpu_shares = spec.cpu_shares;
        }
        if spec.cpu_quota != 0 {
            self.cpu_quota = spec.cpu_quota;
        }
        if spec.cpu_period != 0 {
            self.cpu_period = spec.cpu_period;
        }
        if !spec.cpuset_cpus.is_empty() {
            self.cpuset.clone_from(&spec.cpuset_cpus);
        }
    }
}

/// A workload known to cglimit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadRecord {
    /// Workload ID, also its cgroup name.
    pub id: WorkloadId,
    /// Process ID of the workload's init process.
    pub pid: u32,
    /// Last recorded status.
    pub status: WorkloadStatus,
    /// Desired resource limits.
    #[serde(default)]
    pub resources: StoredResources,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

impl WorkloadRecord {
    /// A running workload with no stored limits.
    #[must_use]
    pub fn new(id: WorkloadId, pid: u32) -> Self {
        Self {
            id,
            pid,
            status: WorkloadStatus::Running,
            resources: StoredResources::default(),
            updated_at: Utc::now(),
        }
    }

    /// Whether the workload is recorded as running and its process exists.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == WorkloadStatus::Running && process_exists(self.pid)
    }
}

fn process_exists(pid: u32) -> bool {
    let Some(pid) = i32::try_from(pid).ok().and_then(Pid::from_raw) else {
        return false;
    };
    // EPERM: the process exists but belongs to someone else.
    match test_kill_process(pid) {
        Ok(()) => true,
        Err(e) => e == Errno::PERM,
    }
}

/// Loads and saves workload records.
#[derive(Debug, Clone)]
pub struct WorkloadStore {
    paths: CgPaths,
}

impl WorkloadStore {
    /// Create a store rooted at `paths`.
    #[must_use]
    pub const fn new(paths: CgPaths) -> Self {
        Self { paths }
    }

    /// Save a workload record, stamping `updated_at`.
    pub fn save(&self, record: &mut WorkloadRecord) -> CgResult<()> {
        let path = self.paths.workload_config(record.id.as_str());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        record.updated_at = Utc::now();
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json)?;

        tracing::debug!(
            workload = %record.id,
            path = %path.display(),
            "Saved workload record"
        );
        Ok(())
    }

    /// Load a workload record.
    pub fn load(&self, id: &str) -> CgResult<WorkloadRecord> {
        let workload = WorkloadId::new(id)?;
        let id = workload.as_str();
        if !self.exists(id) {
            return Err(CgError::WorkloadNotFound { id: id.to_string() });
        }
        let path = self.paths.workload_config(id);

        let json = std::fs::read_to_string(&path)?;
        let record: WorkloadRecord = serde_json::from_str(&json)?;

        tracing::debug!(
            workload = %id,
            path = %path.display(),
            "Loaded workload record"
        );
        Ok(record)
    }

    /// Check if a workload record exists.
    #[must_use]
    pub fn exists(&self, id: &str) -> bool {
        self.paths.workload_config(id).exists()
    }
}
