//! Memory controller.

use std::path::Path;

use cglimit_common::{CgError, CgResult};

use super::controller::{Controller, ControllerKind};
use super::stats::{MemoryData, MemoryStats, parse_key_values};
use super::{ControllerData, ResourceLimitSpec, Stats, util};

const CGROUP_MEMORY_LIMIT: &str = "memory.limit_in_bytes";
const CGROUP_MEMORY_SOFT_LIMIT: &str = "memory.soft_limit_in_bytes";
const CGROUP_MEMORY_SWAP_LIMIT: &str = "memory.memsw.limit_in_bytes";
const CGROUP_MEMORY_STAT: &str = "memory.stat";

/// The `memory` controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryGroup;

impl Controller for MemoryGroup {
    fn apply(&self, data: &ControllerData) -> CgResult<()> {
        let joined = data.path(ControllerKind::Memory).and_then(|dir| {
            util::join(ControllerKind::Memory.name(), &dir, data.pid)?;
            Ok(dir)
        });

        // The controller may be unmounted as long as no memory limit is asked for.
        let dir = match joined {
            Ok(dir) => dir,
            Err(err) if !Self::requested(&data.spec) => {
                tracing::debug!(
                    workload = %data.spec.name,
                    error = %err,
                    "Memory controller unavailable, skipping"
                );
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        Self::set(&dir, &data.spec)
    }

    fn remove(&self, data: &ControllerData) -> CgResult<()> {
        util::remove_dir(&data.path(ControllerKind::Memory)?)
    }

    fn stats(&self, path: &Path, stats: &mut Stats) -> CgResult<()> {
        let usage = Self::memory_data(path, "memory")?.ok_or_else(|| {
            CgError::file(
                path.join("memory.usage_in_bytes"),
                std::io::ErrorKind::NotFound.into(),
            )
        })?;
        let swap_usage = Self::memory_data(path, "memory.memsw")?;
        let counters = parse_key_values(&util::read_file(&path.join(CGROUP_MEMORY_STAT))?);

        stats.memory = Some(MemoryStats {
            usage,
            swap_usage,
            stats: counters,
        });
        Ok(())
    }
}

impl MemoryGroup {
    const fn requested(spec: &ResourceLimitSpec) -> bool {
        spec.memory != 0 || spec.memory_reservation != 0 || spec.memory_swap != 0
    }

    fn set(dir: &Path, spec: &ResourceLimitSpec) -> CgResult<()> {
        let name = ControllerKind::Memory.name();

        if spec.memory != 0 {
            util::write_file(name, dir, CGROUP_MEMORY_LIMIT, &spec.memory.to_string())?;
        }
        if spec.memory_reservation != 0 {
            util::write_file(
                name,
                dir,
                CGROUP_MEMORY_SOFT_LIMIT,
                &spec.memory_reservation.to_string(),
            )?;
        }
        // memsw must not drop below the memory limit written above.
        if spec.memory_swap != 0 {
            util::write_file(
                name,
                dir,
                CGROUP_MEMORY_SWAP_LIMIT,
                &spec.memory_swap.to_string(),
            )?;
        }

        Ok(())
    }

    /// Counters for `prefix` (`memory` or `memory.memsw`), `None` when the
    /// kernel does not expose them.
    fn memory_data(dir: &Path, prefix: &str) -> CgResult<Option<MemoryData>> {
        let Some(usage) = util::read_optional_value(dir, &format!("{prefix}.usage_in_bytes"))?
        else {
            return Ok(None);
        };

        Ok(Some(MemoryData {
            usage,
            max_usage: util::read_value(dir, &format!("{prefix}.max_usage_in_bytes"))?,
            failcnt: util::read_value(dir, &format!("{prefix}.failcnt"))?,
            limit: util::read_value(dir, &format!("{prefix}.limit_in_bytes"))?,
        }))
    }
}
