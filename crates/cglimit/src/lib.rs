//! # cglimit
//!
//! cglimit changes the resource limits of running workloads through the
//! cgroup v1 filesystem.
//!
//! ## Features
//!
//! - **Controllers**: `memory`, `cpu` and `cpuset`, applied in a fixed order
//! - **Cpuset bootstrapping**: empty `cpuset.cpus`/`cpuset.mems` masks are
//!   inherited from the nearest configured ancestor
//! - **Direct access**: read or write a single allow-listed control file
//! - **Stats**: usage counters from every controller that is present
//!
//! ## Usage
//!
//! ```no_run
//! use cglimit::cgroup::{Hierarchy, ResourceLimitSpec, set_resources};
//!
//! # fn example() -> cglimit_common::CgResult<()> {
//! let spec = ResourceLimitSpec {
//!     memory: 512 * 1024 * 1024,
//!     cpu_shares: 512,
//!     ..ResourceLimitSpec::new("web", "docker")
//! };
//!
//! set_resources(spec, 4242, &Hierarchy::new())?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cgroup;
pub mod cli;
pub mod runtime;

pub use runtime::{RuntimeConfig, change_limits};
