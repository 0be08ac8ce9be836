//! Common error types for cglimit.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`CgError`].
pub type CgResult<T> = Result<T, CgError>;

/// Errors raised while resolving, changing or reading cgroup resources.
#[derive(Error, Diagnostic, Debug)]
pub enum CgError {
    /// The cgroup filesystem is not mounted or its root does not exist.
    #[error("cgroups fs not found: {}", .path.display())]
    #[diagnostic(
        code(cglimit::hierarchy::not_found),
        help("Make sure the cgroup v1 hierarchy is mounted (usually under /sys/fs/cgroup)")
    )]
    HierarchyNotFound {
        /// The hierarchy root that was looked up.
        path: PathBuf,
    },

    /// The requested control file is not in the accessible set.
    #[error("this subsystem can not be accessed: {name}")]
    #[diagnostic(
        code(cglimit::controller::unsupported),
        help("Accessible files: cpu.shares, cpu.cfs_period_us, cpu.cfs_quota_us, cpuset.cpus, memory.limit_in_bytes, memory.soft_limit_in_bytes, memory.memsw.limit_in_bytes, freezer.state")
    )]
    UnsupportedController {
        /// The control file or controller name that was requested.
        name: String,
    },

    /// The workload has no directory for this controller.
    #[error("{} not found", .path.display())]
    #[diagnostic(code(cglimit::path::not_found))]
    PathNotFound {
        /// The directory that does not exist.
        path: PathBuf,
    },

    /// The kernel refused a value written to a control file.
    #[error("{controller}: failed to write {value:?} to {}: {source}", .path.display())]
    #[diagnostic(code(cglimit::write_rejected))]
    WriteRejected {
        /// Controller owning the file.
        controller: String,
        /// Control file that was written.
        path: PathBuf,
        /// Value that was attempted.
        value: String,
        /// Underlying error from the kernel.
        #[source]
        source: std::io::Error,
    },

    /// A controller failed after earlier controllers had already been applied.
    #[error("{controller} failed after {} was applied: {source}", .applied.join(", "))]
    #[diagnostic(
        code(cglimit::apply::partial),
        help("Resources may be partially changed; inspect the current values before trusting the old configuration")
    )]
    PartialApplyFailure {
        /// Controller that failed.
        controller: String,
        /// Controllers that were applied before the failure.
        applied: Vec<String>,
        /// The failure itself.
        #[source]
        source: Box<CgError>,
    },

    /// A cpuset group has no cpus or mems to hand down to its children.
    #[error("{}: cpuset.cpus or cpuset.mems is empty", .path.display())]
    #[diagnostic(
        code(cglimit::cpuset::empty_mask),
        help("Configure cpuset.cpus and cpuset.mems on the cpuset hierarchy root first")
    )]
    EmptyCpusetMask {
        /// The group whose masks are empty.
        path: PathBuf,
    },

    /// I/O error on a specific cgroup file or directory.
    #[error("{}: {source}", .path.display())]
    #[diagnostic(code(cglimit::file))]
    File {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid workload ID format.
    #[error("Invalid workload ID: {id}")]
    #[diagnostic(
        code(cglimit::workload::invalid_id),
        help("Workload IDs must be alphanumeric with hyphens, dots and underscores, 1-64 characters")
    )]
    InvalidWorkloadId {
        /// The invalid workload ID.
        id: String,
    },

    /// Invalid resource quantity format.
    #[error("Invalid resource quantity: {value}")]
    #[diagnostic(
        code(cglimit::resource::invalid_quantity),
        help("Use formats like '512m', '1g', '2Gi', '500Mi' or a plain number of bytes")
    )]
    InvalidResourceQuantity {
        /// The invalid value.
        value: String,
    },

    /// Workload not found.
    #[error("No such workload: {id}")]
    #[diagnostic(code(cglimit::workload::not_found))]
    WorkloadNotFound {
        /// The workload ID that was not found.
        id: String,
    },

    /// Workload is not running.
    #[error("Workload {id} already stopped")]
    #[diagnostic(
        code(cglimit::workload::not_running),
        help("Limits can only be changed on a running workload")
    )]
    WorkloadNotRunning {
        /// The stopped workload.
        id: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(cglimit::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(cglimit::serialization))]
    Serialization(String),
}

impl CgError {
    /// Wrap an I/O error with the file it happened on.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means "the workload is not in this controller".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::PathNotFound { .. })
    }
}

impl From<serde_json::Error> for CgError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
