//! Applying, reading and removing a workload's resources across all
//! controllers, plus direct access to single control files.

use cglimit_common::{CgError, CgResult};

use super::hierarchy::find_group;
use super::{ControllerData, ControllerKind, Hierarchy, ResourceLimitSpec, Stats, util};

/// Apply `spec` to every controller in registry order and join `pid`.
///
/// There is no rollback: when a controller fails after others succeeded,
/// the error is a [`CgError::PartialApplyFailure`] and the workload may be
/// left with some of the new limits.
pub fn set_resources(
    spec: ResourceLimitSpec,
    pid: u32,
    hierarchy: &Hierarchy,
) -> CgResult<ControllerData> {
    let data = ControllerData::new(spec, pid, hierarchy.clone())?;

    let mut applied: Vec<String> = Vec::new();
    for kind in ControllerKind::ALL {
        if let Err(err) = kind.controller().apply(&data) {
            tracing::debug!(
                workload = %data.spec.name,
                controller = %kind,
                error = %err,
                "Failed to apply controller"
            );
            if applied.is_empty() {
                return Err(err);
            }
            return Err(CgError::PartialApplyFailure {
                controller: kind.to_string(),
                applied,
                source: Box::new(err),
            });
        }
        applied.push(kind.to_string());
    }

    tracing::debug!(workload = %data.spec.name, pid, "Applied resources");
    Ok(data)
}

/// Read counters from every controller the workload belongs to.
///
/// A controller without a directory for the workload is skipped; any other
/// failure aborts the whole collection.
pub fn get_all_stats(spec: ResourceLimitSpec, pid: u32, hierarchy: &Hierarchy) -> CgResult<Stats> {
    let data = ControllerData::new(spec, pid, hierarchy.clone())?;
    let mut stats = Stats::default();

    for kind in ControllerKind::ALL {
        let path = match data.existing_path(kind) {
            Ok(path) => path,
            Err(err) if err.is_not_found() => {
                tracing::debug!(workload = %data.spec.name, controller = %kind, "No stats, not joined");
                continue;
            }
            Err(err) => return Err(err),
        };
        kind.controller().stats(&path, &mut stats)?;
    }

    Ok(stats)
}

/// Remove the workload's directory from every controller.
///
/// Every controller is attempted; the first failure is returned.
pub fn remove_resources(data: &ControllerData) -> CgResult<()> {
    let mut first_err = None;

    for kind in ControllerKind::ALL {
        if let Err(err) = kind.controller().remove(data) {
            if err.is_not_found() {
                continue;
            }
            tracing::warn!(
                workload = %data.spec.name,
                controller = %kind,
                error = %err,
                "Failed to remove cgroup"
            );
            first_err.get_or_insert(err);
        }
    }

    first_err.map_or(Ok(()), Err)
}

/// Read one control file of workload `id`.
pub fn get(hierarchy: &Hierarchy, id: &str, driver: &str, file: &str) -> CgResult<String> {
    let path = hierarchy.resolve(driver, file, id)?;
    util::read_file(&path)
}

/// Write `value` to one control file of workload `id`.
pub fn set(hierarchy: &Hierarchy, id: &str, driver: &str, file: &str, value: &str) -> CgResult<()> {
    let path = hierarchy.resolve(driver, file, id)?;
    let group = find_group(file)?;
    let dir = path.parent().ok_or_else(|| CgError::PathNotFound {
        path: path.clone(),
    })?;
    util::write_file(group, dir, file, value)
}
