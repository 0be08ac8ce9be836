//! Standard filesystem paths for cglimit.

use std::path::PathBuf;

use once_cell::sync::Lazy;

/// Default root directory for persisted workload records.
pub static CGLIMIT_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("CGLIMIT_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib/cglimit"))
});

/// Mount table used to locate the cgroup hierarchy.
pub static PROC_MOUNTINFO: Lazy<PathBuf> = Lazy::new(|| PathBuf::from("/proc/self/mountinfo"));

/// Cgroup membership of the init process, giving each controller's init subpath.
pub static PROC_INIT_CGROUP: Lazy<PathBuf> = Lazy::new(|| PathBuf::from("/proc/1/cgroup"));

/// Standard paths used by cglimit.
#[derive(Debug, Clone)]
pub struct CgPaths {
    /// Root data directory (default: /var/lib/cglimit).
    pub root: PathBuf,
}

impl CgPaths {
    /// Create paths with default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding one subdirectory per workload.
    #[must_use]
    pub fn workloads(&self) -> PathBuf {
        self.root.join("workloads")
    }

    /// Directory for a specific workload.
    #[must_use]
    pub fn workload(&self, id: &str) -> PathBuf {
        self.workloads().join(id)
    }

    /// Persisted workload config file.
    #[must_use]
    pub fn workload_config(&self, id: &str) -> PathBuf {
        self.workload(id).join("config.json")
    }
}

impl Default for CgPaths {
    fn default() -> Self {
        Self {
            root: CGLIMIT_ROOT.clone(),
        }
    }
}
