//! Cpuset controller.
//!
//! A cpuset group only accepts processes once both `cpuset.cpus` and
//! `cpuset.mems` are non-empty, and the kernel creates child groups with
//! both masks empty. Before a workload can join, every group between the
//! hierarchy root and the workload's directory has to exist and carry masks
//! inherited from its parent. The walk never goes above the controller's
//! base directory, whose masks belong to the host.

use std::path::{Path, PathBuf};

use cglimit_common::{CgError, CgResult};

use super::controller::{Controller, ControllerKind};
use super::stats::CpusetStats;
use super::{ControllerData, Stats, util};

const CGROUP_CPUSET_CPUS: &str = "cpuset.cpus";
const CGROUP_CPUSET_MEMS: &str = "cpuset.mems";

/// The `cpuset` controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpusetGroup;

impl Controller for CpusetGroup {
    fn apply(&self, data: &ControllerData) -> CgResult<()> {
        // Joining this cgroup is opt-in: an empty mask is never written.
        if data.spec.cpuset_cpus.is_empty() {
            return Ok(());
        }

        let base = data.base(ControllerKind::Cpuset)?;
        let dir = data.path(ControllerKind::Cpuset)?;
        self.set_dir(&base, &dir, &data.spec.cpuset_cpus, data.pid)
    }

    fn remove(&self, data: &ControllerData) -> CgResult<()> {
        util::remove_dir(&data.path(ControllerKind::Cpuset)?)
    }

    fn stats(&self, path: &Path, stats: &mut Stats) -> CgResult<()> {
        let (cpus, mems) = Self::masks(path)?;
        stats.cpuset = Some(CpusetStats {
            cpus: cpus.trim().to_string(),
            mems: mems.trim().to_string(),
        });
        Ok(())
    }
}

impl CpusetGroup {
    /// Prepare `dir` and its ancestors below `base`, move `pid` in, then
    /// pin it to `cpus`.
    pub fn set_dir(&self, base: &Path, dir: &Path, cpus: &str, pid: u32) -> CgResult<()> {
        self.ensure_parent(base, dir)?;

        // The pid has to be placed before the mask is narrowed.
        let name = ControllerKind::Cpuset.name();
        util::write_file(name, dir, util::CGROUP_PROCS, &pid.to_string())?;
        util::write_file(name, dir, CGROUP_CPUSET_CPUS, cpus)
    }

    /// Make sure `current` and every ancestor below `base` that is missing
    /// or has an empty mask exist and carry masks copied from their parent.
    ///
    /// Ancestors are collected walking up from `current` and then created
    /// root to leaf, so each group is populated before its children copy
    /// from it. `base` itself is only read. Fails with
    /// [`CgError::EmptyCpusetMask`] if `current` still has an empty mask
    /// afterwards.
    pub fn ensure_parent(&self, base: &Path, current: &Path) -> CgResult<()> {
        if !current.starts_with(base) {
            return Err(CgError::PathNotFound {
                path: current.to_path_buf(),
            });
        }

        let mut pending: Vec<&Path> = Vec::new();
        for dir in current.ancestors() {
            if dir == base || (!pending.is_empty() && !Self::needs_setup(dir)?) {
                break;
            }
            pending.push(dir);
        }

        while let Some(dir) = pending.pop() {
            util::create_dir(dir)?;
            if let Some(parent) = dir.parent() {
                self.copy_if_needed(dir, parent)?;
            }
        }

        if Self::needs_setup(current)? {
            return Err(CgError::EmptyCpusetMask {
                path: current.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Copy `cpuset.cpus` and `cpuset.mems` from `parent` into `current`
    /// for each mask that is empty in `current`.
    ///
    /// A non-empty mask in `current` is never overwritten. Nothing is
    /// written when `parent` has no mask to hand down.
    pub fn copy_if_needed(&self, current: &Path, parent: &Path) -> CgResult<()> {
        let (current_cpus, current_mems) = Self::masks(current)?;
        if !is_empty(&current_cpus) && !is_empty(&current_mems) {
            return Ok(());
        }
        let (parent_cpus, parent_mems) = Self::masks(parent)?;

        let copies = [
            (CGROUP_CPUSET_CPUS, &current_cpus, &parent_cpus),
            (CGROUP_CPUSET_MEMS, &current_mems, &parent_mems),
        ];
        if copies
            .iter()
            .any(|(_, own, inherited)| is_empty(own) && is_empty(inherited))
        {
            return Err(CgError::EmptyCpusetMask {
                path: parent.to_path_buf(),
            });
        }

        let name = ControllerKind::Cpuset.name();
        for (file, own, inherited) in copies {
            if is_empty(own) {
                util::write_file(name, current, file, inherited.trim_end_matches('\n'))?;
            }
        }

        Ok(())
    }

    fn needs_setup(dir: &Path) -> CgResult<bool> {
        if !dir.exists() {
            return Ok(true);
        }
        let (cpus, mems) = Self::masks(dir)?;
        Ok(is_empty(&cpus) || is_empty(&mems))
    }

    /// Current `(cpus, mems)` of `dir`. A mask file that does not exist
    /// reads as empty.
    fn masks(dir: &Path) -> CgResult<(String, String)> {
        Ok((
            read_mask(&dir.join(CGROUP_CPUSET_CPUS))?,
            read_mask(&dir.join(CGROUP_CPUSET_MEMS))?,
        ))
    }
}

fn read_mask(path: &Path) -> CgResult<String> {
    match std::fs::read_to_string(path) {
        Ok(mask) => Ok(mask),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(CgError::file(path, e)),
    }
}

fn is_empty(mask: &str) -> bool {
    mask.trim_matches('\n').is_empty()
}
