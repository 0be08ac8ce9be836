//! Workload bookkeeping around the cgroup core.
//!
//! This module keeps persisted workload records and implements the
//! "change a running workload's limits" request on top of [`crate::cgroup`].

mod config;
mod limit;
mod store;

pub use config::{DEFAULT_DRIVER, RuntimeConfig};
pub use limit::{LimitError, LimitRequest, change_limits};
pub use store::{StoredResources, WorkloadRecord, WorkloadStatus, WorkloadStore};
