//! Locating controller directories inside the cgroup v1 hierarchy.
//!
//! All controllers are expected to be mounted side by side under one root
//! (`/sys/fs/cgroup/cpu`, `/sys/fs/cgroup/memory`, ...). The root is found
//! from the mount point of the `cpu` controller and re-read on every lookup,
//! since the hierarchy can be remounted between calls.

use std::path::{Path, PathBuf};

use cglimit_common::paths::{PROC_INIT_CGROUP, PROC_MOUNTINFO};
use cglimit_common::{CgError, CgResult, WorkloadId};

use super::mountinfo;

/// Controller whose mount point locates the hierarchy root.
const REFERENCE_CONTROLLER: &str = "cpu";

/// Control files that may be read or written directly, by controller.
pub const ACCESSIBLE_FILES: &[(&str, &[&str])] = &[
    ("cpu", &["cpu.shares", "cpu.cfs_period_us", "cpu.cfs_quota_us"]),
    ("cpuset", &["cpuset.cpus"]),
    (
        "memory",
        &[
            "memory.limit_in_bytes",
            "memory.soft_limit_in_bytes",
            "memory.memsw.limit_in_bytes",
        ],
    ),
    ("freezer", &["freezer.state"]),
];

/// Controller that owns an accessible control file.
pub fn find_group(file: &str) -> CgResult<&'static str> {
    ACCESSIBLE_FILES
        .iter()
        .find(|(_, files)| files.contains(&file))
        .map(|(group, _)| *group)
        .ok_or_else(|| CgError::UnsupportedController {
            name: file.to_string(),
        })
}

/// Where to look for the cgroup hierarchy.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    mountinfo: PathBuf,
    init_cgroup: PathBuf,
    root: Option<PathBuf>,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self {
            mountinfo: PROC_MOUNTINFO.clone(),
            init_cgroup: PROC_INIT_CGROUP.clone(),
            root: None,
        }
    }
}

impl Hierarchy {
    /// Use the host's mount table and init process cgroups.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read mount points from another mountinfo file.
    #[must_use]
    pub fn with_mountinfo(mut self, path: impl Into<PathBuf>) -> Self {
        self.mountinfo = path.into();
        self
    }

    /// Read init subpaths from another `/proc/<pid>/cgroup` file.
    #[must_use]
    pub fn with_init_cgroup(mut self, path: impl Into<PathBuf>) -> Self {
        self.init_cgroup = path.into();
        self
    }

    /// Use a fixed hierarchy root instead of looking it up in mountinfo.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// The directory all controllers are mounted under.
    pub fn root(&self) -> CgResult<PathBuf> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => mountinfo::find_mountpoint(&self.mountinfo, REFERENCE_CONTROLLER)?
                .and_then(|mnt| mnt.parent().map(Path::to_path_buf))
                .ok_or_else(|| CgError::HierarchyNotFound {
                    path: self.mountinfo.clone(),
                })?,
        };

        if !root.exists() {
            return Err(CgError::HierarchyNotFound { path: root });
        }
        Ok(root)
    }

    /// `root/group/<init subpath>`, the base every workload directory of
    /// `group` is placed under.
    fn group_base(&self, root: &Path, group: &str) -> CgResult<PathBuf> {
        let mount = root.join(group);
        if !mount.exists() {
            return Err(CgError::PathNotFound { path: mount });
        }
        let Some(init) = mountinfo::init_subpath(&self.init_cgroup, group)? else {
            return Err(CgError::PathNotFound { path: mount });
        };
        Ok(mount.join(relative(&init)))
    }

    /// `root/group/<init subpath>` for `group`, the topmost directory cglimit
    /// manages in that controller.
    pub fn controller_base(&self, group: &str) -> CgResult<PathBuf> {
        let root = self.root()?;
        self.group_base(&root, group)
    }

    /// Directory of workload `name` under `parent` for `group`.
    ///
    /// The directory itself does not have to exist yet.
    pub fn controller_dir(&self, group: &str, parent: &str, name: &str) -> CgResult<PathBuf> {
        let root = self.root()?;
        let base = self.group_base(&root, group)?;
        Ok(base.join(relative(parent)).join(relative(name)))
    }

    /// Path of control `file` for workload `id` placed by `driver`.
    ///
    /// Fails with [`CgError::InvalidWorkloadId`] unless `id` is a single
    /// path component, and with [`CgError::PathNotFound`] when the workload
    /// has no directory in the owning controller.
    pub fn resolve(&self, driver: &str, file: &str, id: &str) -> CgResult<PathBuf> {
        let id = WorkloadId::new(id)?;
        let root = self.root()?;
        let group = find_group(file)?;
        let dir = self
            .group_base(&root, group)?
            .join(relative(driver))
            .join(id.as_str());

        if !dir.exists() {
            return Err(CgError::PathNotFound { path: dir });
        }
        Ok(dir.join(file))
    }
}

fn relative(path: &str) -> &str {
    path.trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::test_util::FakeHierarchy;

    #[test]
    fn root_is_parent_of_cpu_mount() {
        let fake = FakeHierarchy::new();
        assert_eq!(fake.hierarchy.root().unwrap(), fake.root);
    }

    #[test]
    fn root_override_skips_mountinfo() {
        let fake = FakeHierarchy::new();
        let hierarchy = Hierarchy::new()
            .with_mountinfo("/nonexistent/mountinfo")
            .with_init_cgroup(fake.init_cgroup())
            .with_root(&fake.root);
        assert_eq!(hierarchy.root().unwrap(), fake.root);
    }

    #[test]
    fn missing_root_is_hierarchy_not_found() {
        let fake = FakeHierarchy::new();
        let hierarchy = fake.hierarchy.clone().with_root(fake.root.join("gone"));
        assert!(matches!(
            hierarchy.root(),
            Err(CgError::HierarchyNotFound { .. })
        ));
    }

    #[test]
    fn unmounted_cpu_is_hierarchy_not_found() {
        let fake = FakeHierarchy::new();
        std::fs::write(fake.mountinfo(), "25 0 8:1 / / rw - ext4 /dev/sda1 rw\n").unwrap();
        assert!(matches!(
            fake.hierarchy.root(),
            Err(CgError::HierarchyNotFound { .. })
        ));
    }

    #[test]
    fn find_group_by_file() {
        assert_eq!(find_group("cpu.shares").unwrap(), "cpu");
        assert_eq!(find_group("memory.memsw.limit_in_bytes").unwrap(), "memory");
        assert_eq!(find_group("freezer.state").unwrap(), "freezer");
        assert!(matches!(
            find_group("devices.allow"),
            Err(CgError::UnsupportedController { .. })
        ));
    }

    #[test]
    fn resolve_existing_workload() {
        let fake = FakeHierarchy::new();
        let dir = fake.dir("memory", "docker/web");
        std::fs::create_dir_all(&dir).unwrap();

        let path = fake
            .hierarchy
            .resolve("docker", "memory.limit_in_bytes", "web")
            .unwrap();
        assert_eq!(path, dir.join("memory.limit_in_bytes"));
    }

    #[test]
    fn resolve_missing_workload_is_path_not_found() {
        let fake = FakeHierarchy::new();
        let err = fake
            .hierarchy
            .resolve("docker", "cpu.shares", "web")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn resolve_rejects_ids_outside_driver() {
        let fake = FakeHierarchy::new();
        std::fs::create_dir_all(fake.dir("cpu", "docker")).unwrap();

        for id in ["", "..", "../docker", "web/child"] {
            let err = fake.hierarchy.resolve("docker", "cpu.shares", id).unwrap_err();
            assert!(
                matches!(err, CgError::InvalidWorkloadId { .. }),
                "{id:?} resolved: {err}"
            );
        }
    }

    #[test]
    fn controller_base_follows_init_subpath() {
        let fake = FakeHierarchy::new();
        std::fs::write(fake.init_cgroup(), "6:cpuset:/init.scope\n").unwrap();
        assert_eq!(
            fake.hierarchy.controller_base("cpuset").unwrap(),
            fake.root.join("cpuset/init.scope")
        );
    }

    #[test]
    fn resolve_checks_allow_list_after_root() {
        let fake = FakeHierarchy::new();
        let err = fake
            .hierarchy
            .resolve("docker", "cgroup.procs", "web")
            .unwrap_err();
        assert!(matches!(err, CgError::UnsupportedController { .. }));

        let gone = fake.hierarchy.clone().with_root(fake.root.join("gone"));
        let err = gone.resolve("docker", "cgroup.procs", "web").unwrap_err();
        assert!(matches!(err, CgError::HierarchyNotFound { .. }));
    }

    #[test]
    fn init_subpath_is_joined() {
        let fake = FakeHierarchy::new();
        std::fs::write(
            fake.init_cgroup(),
            "4:cpu,cpuacct:/system.slice\n6:cpuset:/\n9:memory:/\n",
        )
        .unwrap();

        let dir = fake.hierarchy.controller_dir("cpu", "docker", "web").unwrap();
        assert_eq!(dir, fake.root.join("cpu/system.slice/docker/web"));
    }

    #[test]
    fn controller_not_in_init_cgroup_is_path_not_found() {
        let fake = FakeHierarchy::new();
        std::fs::write(fake.init_cgroup(), "4:cpu,cpuacct:/\n9:memory:/\n").unwrap();

        let err = fake
            .hierarchy
            .controller_dir("cpuset", "docker", "web")
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
