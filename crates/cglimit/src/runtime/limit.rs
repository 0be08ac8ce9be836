//! Changing the limits of a running workload.

use miette::Diagnostic;
use thiserror::Error;

use cglimit_common::{CgError, WorkloadId};

use super::{RuntimeConfig, WorkloadStore};
use crate::cgroup::{ControllerData, ResourceLimitSpec, set_resources};

/// A request to change a workload's limits.
///
/// Zero or empty fields leave the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitRequest {
    /// Target workload.
    pub id: String,
    /// Hard memory limit in bytes.
    pub memory: u64,
    /// Soft memory limit in bytes.
    pub memory_reservation: u64,
    /// Memory plus swap limit in bytes, `-1` for unlimited.
    pub memory_swap: i64,
    /// Relative CPU weight.
    pub cpu_shares: u64,
    /// CFS quota in microseconds, `-1` for unlimited.
    pub cpu_quota: i64,
    /// CFS period in microseconds.
    pub cpu_period: u64,
    /// CPU pinning mask.
    pub cpuset: String,
    /// Also store the new values in the workload record.
    pub save: bool,
}

impl LimitRequest {
    fn spec(&self, driver: &str) -> ResourceLimitSpec {
        ResourceLimitSpec {
            memory: self.memory,
            memory_reservation: self.memory_reservation,
            memory_swap: self.memory_swap,
            cpu_shares: self.cpu_shares,
            cpu_quota: self.cpu_quota,
            cpu_period: self.cpu_period,
            cpuset_cpus: self.cpuset.clone(),
            ..ResourceLimitSpec::new(self.id.clone(), driver)
        }
    }
}

/// Why a limit change did not go through.
#[derive(Error, Diagnostic, Debug)]
pub enum LimitError {
    /// The workload cannot be looked up or is not running.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Workload(#[from] CgError),

    /// Applying the limits failed; they may be partially changed.
    #[error("{id}: Failed to change resources: {source}")]
    #[diagnostic(code(cglimit::limit::apply))]
    Apply {
        /// Target workload.
        id: String,
        /// What went wrong.
        #[source]
        source: CgError,
    },

    /// The limits were applied but could not be stored.
    #[error("{id}: Failed to save changes: {source}")]
    #[diagnostic(code(cglimit::limit::save))]
    Save {
        /// Target workload.
        id: String,
        /// What went wrong.
        #[source]
        source: CgError,
    },
}

/// Apply `request` to a running workload and optionally persist it.
///
/// Only fields set in the request are persisted, so stored values are never
/// replaced with "unset".
pub fn change_limits(
    config: &RuntimeConfig,
    request: &LimitRequest,
) -> Result<ControllerData, LimitError> {
    let id = WorkloadId::new(request.id.as_str())?;
    let store = WorkloadStore::new(config.paths.clone());
    let mut record = store.load(id.as_str())?;
    if !record.is_running() {
        return Err(CgError::WorkloadNotRunning { id: id.to_string() }.into());
    }

    let spec = request.spec(&config.driver);
    if spec.is_unset() {
        tracing::debug!(workload = %id, "No limits requested, only joining controllers");
    }
    tracing::debug!(
        workload = %id,
        memory = spec.memory,
        cpu_shares = spec.cpu_shares,
        cpuset = %spec.cpuset_cpus,
        "Changing resources"
    );

    let data = set_resources(spec, record.pid, &config.hierarchy).map_err(|source| {
        LimitError::Apply {
            id: id.to_string(),
            source,
        }
    })?;

    if request.save {
        record.resources.merge(&data.spec);
        store.save(&mut record).map_err(|source| LimitError::Save {
            id: id.to_string(),
            source,
        })?;
    }

    tracing::info!(workload = %id, saved = request.save, "Changed resources");
    Ok(data)
}
