//! The controller contract and the fixed set of supported controllers.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use cglimit_common::CgResult;

use super::cpu::CpuGroup;
use super::cpuset::CpusetGroup;
use super::memory::MemoryGroup;
use super::{ControllerData, Stats};

/// One cgroup v1 controller.
pub trait Controller {
    /// Write this controller's part of `data.spec` and join `data.pid`.
    ///
    /// Only fields owned by the controller are written, and unset fields
    /// are skipped.
    fn apply(&self, data: &ControllerData) -> CgResult<()>;

    /// Remove the workload's directory. An absent directory is success.
    fn remove(&self, data: &ControllerData) -> CgResult<()>;

    /// Read accounting counters from `path` into `stats`.
    fn stats(&self, path: &Path, stats: &mut Stats) -> CgResult<()>;
}

/// Supported controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    /// `memory`
    Memory,
    /// `cpu`
    Cpu,
    /// `cpuset`
    Cpuset,
}

impl ControllerKind {
    /// Every controller, in the order limits are applied.
    pub const ALL: [Self; 3] = [Self::Memory, Self::Cpu, Self::Cpuset];

    /// Directory name of the controller in the hierarchy.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Cpu => "cpu",
            Self::Cpuset => "cpuset",
        }
    }

    /// The implementation for this controller.
    #[must_use]
    pub fn controller(self) -> &'static dyn Controller {
        match self {
            Self::Memory => &MemoryGroup,
            Self::Cpu => &CpuGroup,
            Self::Cpuset => &CpusetGroup,
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
