//! Runtime configuration.

use std::path::PathBuf;

use cglimit_common::CgPaths;

use crate::cgroup::Hierarchy;

/// Driver name used when none is configured.
pub const DEFAULT_DRIVER: &str = "docker";

/// Runtime configuration options.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Paths for persisted workload records.
    pub paths: CgPaths,
    /// Where the cgroup hierarchy is found.
    pub hierarchy: Hierarchy,
    /// Directory workloads are placed under in every controller.
    pub driver: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            paths: CgPaths::new(),
            hierarchy: Hierarchy::new(),
            driver: DEFAULT_DRIVER.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Set the root directory.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths = CgPaths::with_root(root);
        self
    }

    /// Use a fixed cgroup hierarchy root.
    #[must_use]
    pub fn with_cgroup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.hierarchy = self.hierarchy.with_root(root);
        self
    }

    /// Read mount points from another mountinfo file.
    #[must_use]
    pub fn with_mountinfo(mut self, path: impl Into<PathBuf>) -> Self {
        self.hierarchy = self.hierarchy.with_mountinfo(path);
        self
    }

    /// Read init subpaths from another cgroup membership file.
    #[must_use]
    pub fn with_init_cgroup(mut self, path: impl Into<PathBuf>) -> Self {
        self.hierarchy = self.hierarchy.with_init_cgroup(path);
        self
    }

    /// Set the driver directory name.
    #[must_use]
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }
}
