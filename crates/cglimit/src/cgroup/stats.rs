//! Accounting counters read back from the controllers.

use std::collections::BTreeMap;

use serde::Serialize;

use super::ControllerKind;

/// Counters for every controller the workload belongs to.
///
/// A controller the workload never joined is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// CPU controller counters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuStats>,
    /// Memory controller counters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryStats>,
    /// Current cpuset masks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpuset: Option<CpusetStats>,
}

impl Stats {
    /// Whether counters were collected for `kind`.
    #[must_use]
    pub const fn contains(&self, kind: ControllerKind) -> bool {
        match kind {
            ControllerKind::Cpu => self.cpu.is_some(),
            ControllerKind::Memory => self.memory.is_some(),
            ControllerKind::Cpuset => self.cpuset.is_some(),
        }
    }
}

/// CPU shares and CFS throttling counters from `cpu.stat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CpuStats {
    /// Current `cpu.shares`.
    pub shares: u64,
    /// Enforcement periods that have elapsed.
    pub nr_periods: u64,
    /// Periods in which the group was throttled.
    pub nr_throttled: u64,
    /// Total time throttled, in nanoseconds.
    pub throttled_time: u64,
}

/// Usage counters for memory or memory plus swap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryData {
    /// Current usage in bytes.
    pub usage: u64,
    /// Peak usage in bytes.
    pub max_usage: u64,
    /// Number of times the limit was hit.
    pub failcnt: u64,
    /// Configured limit in bytes.
    pub limit: u64,
}

/// Memory controller counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// Memory usage.
    pub usage: MemoryData,
    /// Memory plus swap usage, when swap accounting is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap_usage: Option<MemoryData>,
    /// Raw `memory.stat` counters.
    pub stats: BTreeMap<String, u64>,
}

/// Masks currently configured for the workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CpusetStats {
    /// `cpuset.cpus`
    pub cpus: String,
    /// `cpuset.mems`
    pub mems: String,
}

/// Parse `key value` lines as found in `cpu.stat` and `memory.stat`.
///
/// Lines that do not hold a number are skipped.
pub fn parse_key_values(content: &str) -> BTreeMap<String, u64> {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let key = parts.next()?;
            let value = parts.next()?.parse().ok()?;
            Some((key.to_string(), value))
        })
        .collect()
}
