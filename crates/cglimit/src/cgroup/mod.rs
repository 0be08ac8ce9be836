//! Cgroup v1 resource control.
//!
//! This module changes and reads back the resource limits of a running
//! workload through the cgroup v1 filesystem. Each supported controller
//! (`memory`, `cpu`, `cpuset`) implements [`Controller`]; [`set_resources`]
//! and [`get_all_stats`] drive all of them in a fixed order.

mod controller;
pub mod cpu;
pub mod cpuset;
mod data;
pub mod fs;
pub mod hierarchy;
pub mod memory;
pub mod mountinfo;
mod stats;
pub mod util;

#[cfg(test)]
pub(crate) mod test_util;

pub use controller::{Controller, ControllerKind};
pub use data::{ControllerData, ResourceLimitSpec};
pub use fs::{get, get_all_stats, remove_resources, set, set_resources};
pub use hierarchy::Hierarchy;
pub use stats::{CpuStats, CpusetStats, MemoryData, MemoryStats, Stats, parse_key_values};
