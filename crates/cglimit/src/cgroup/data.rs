//! The per-call input shared by every controller.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use cglimit_common::{CgError, CgResult, WorkloadId};

use super::{ControllerKind, Hierarchy};

/// Resource limits to apply to one workload.
///
/// A zero or empty field means "leave the current kernel value alone",
/// never "set it to zero".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimitSpec {
    /// Workload cgroup name (the workload ID).
    pub name: String,
    /// Directory the workload's cgroup is placed under in every controller.
    pub parent: String,
    /// Hard memory limit in bytes (`memory.limit_in_bytes`).
    pub memory: u64,
    /// Soft memory limit in bytes (`memory.soft_limit_in_bytes`).
    pub memory_reservation: u64,
    /// Memory plus swap limit in bytes, `-1` for unlimited
    /// (`memory.memsw.limit_in_bytes`).
    pub memory_swap: i64,
    /// Relative CPU weight (`cpu.shares`).
    pub cpu_shares: u64,
    /// CFS quota in microseconds, `-1` for unlimited (`cpu.cfs_quota_us`).
    pub cpu_quota: i64,
    /// CFS period in microseconds (`cpu.cfs_period_us`).
    pub cpu_period: u64,
    /// CPUs the workload may run on, e.g. `0-3` or `0,2` (`cpuset.cpus`).
    pub cpuset_cpus: String,
}

impl ResourceLimitSpec {
    /// Limits for workload `name` under `parent` with every field unset.
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            ..Self::default()
        }
    }

    /// Whether no limit is set at all.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.memory == 0
            && self.memory_reservation == 0
            && self.memory_swap == 0
            && self.cpu_shares == 0
            && self.cpu_quota == 0
            && self.cpu_period == 0
            && self.cpuset_cpus.is_empty()
    }
}

/// Everything a controller needs to apply limits for one call.
///
/// Built per request and dropped afterwards; directories are resolved on
/// every access rather than cached.
#[derive(Debug, Clone)]
pub struct ControllerData {
    /// Limits to apply.
    pub spec: ResourceLimitSpec,
    /// Process to join into the workload's groups.
    pub pid: u32,
    hierarchy: Hierarchy,
}

impl ControllerData {
    /// Bundle a spec and pid, checking that the workload name is a single
    /// path component and that the hierarchy is mounted.
    pub fn new(spec: ResourceLimitSpec, pid: u32, hierarchy: Hierarchy) -> CgResult<Self> {
        WorkloadId::new(spec.name.as_str())?;
        hierarchy.root()?;
        Ok(Self {
            spec,
            pid,
            hierarchy,
        })
    }

    /// Topmost directory managed in `kind`; nothing above it is touched.
    pub fn base(&self, kind: ControllerKind) -> CgResult<PathBuf> {
        self.hierarchy.controller_base(kind.name())
    }

    /// Directory of this workload for `kind`, which may not exist yet.
    pub fn path(&self, kind: ControllerKind) -> CgResult<PathBuf> {
        self.hierarchy
            .controller_dir(kind.name(), &self.spec.parent, &self.spec.name)
    }

    /// Directory of this workload for `kind`, failing with
    /// [`CgError::PathNotFound`] if the workload never joined it.
    pub fn existing_path(&self, kind: ControllerKind) -> CgResult<PathBuf> {
        let path = self.path(kind)?;
        if !path.exists() {
            return Err(CgError::PathNotFound { path });
        }
        Ok(path)
    }
}
