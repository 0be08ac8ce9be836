//! CPU controller: shares and CFS bandwidth.

use std::path::Path;

use cglimit_common::CgResult;

use super::controller::{Controller, ControllerKind};
use super::stats::{CpuStats, parse_key_values};
use super::{ControllerData, ResourceLimitSpec, Stats, util};

const CGROUP_CPU_SHARES: &str = "cpu.shares";
const CGROUP_CPU_PERIOD: &str = "cpu.cfs_period_us";
const CGROUP_CPU_QUOTA: &str = "cpu.cfs_quota_us";
const CGROUP_CPU_STAT: &str = "cpu.stat";

/// The `cpu` controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuGroup;

impl Controller for CpuGroup {
    fn apply(&self, data: &ControllerData) -> CgResult<()> {
        let dir = data.path(ControllerKind::Cpu)?;
        util::join(ControllerKind::Cpu.name(), &dir, data.pid)?;
        Self::set(&dir, &data.spec)
    }

    fn remove(&self, data: &ControllerData) -> CgResult<()> {
        util::remove_dir(&data.path(ControllerKind::Cpu)?)
    }

    fn stats(&self, path: &Path, stats: &mut Stats) -> CgResult<()> {
        let shares = util::read_value(path, CGROUP_CPU_SHARES)?;
        let counters = parse_key_values(&util::read_file(&path.join(CGROUP_CPU_STAT))?);
        let counter = |key: &str| counters.get(key).copied().unwrap_or_default();

        stats.cpu = Some(CpuStats {
            shares,
            nr_periods: counter("nr_periods"),
            nr_throttled: counter("nr_throttled"),
            throttled_time: counter("throttled_time"),
        });
        Ok(())
    }
}

impl CpuGroup {
    fn set(dir: &Path, spec: &ResourceLimitSpec) -> CgResult<()> {
        let name = ControllerKind::Cpu.name();

        if spec.cpu_shares != 0 {
            util::write_file(name, dir, CGROUP_CPU_SHARES, &spec.cpu_shares.to_string())?;
        }
        // The period bounds the quota, so it goes first.
        if spec.cpu_period != 0 {
            util::write_file(name, dir, CGROUP_CPU_PERIOD, &spec.cpu_period.to_string())?;
        }
        if spec.cpu_quota != 0 {
            util::write_file(name, dir, CGROUP_CPU_QUOTA, &spec.cpu_quota.to_string())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::test_util::FakeHierarchy;

    fn data(fake: &FakeHierarchy, spec: ResourceLimitSpec) -> ControllerData {
        ControllerData::new(spec, 4242, fake.hierarchy.clone()).unwrap()
    }

    #[test]
    fn apply_shares_and_bandwidth() {
        let fake = FakeHierarchy::new();
        let spec = ResourceLimitSpec {
            cpu_shares: 512,
            cpu_period: 100_000,
            cpu_quota: 50_000,
            ..ResourceLimitSpec::new("web", "docker")
        };

        CpuGroup.apply(&data(&fake, spec)).unwrap();

        assert_eq!(fake.read("cpu", "docker/web/cpu.shares"), "512");
        assert_eq!(fake.read("cpu", "docker/web/cpu.cfs_period_us"), "100000");
        assert_eq!(fake.read("cpu", "docker/web/cpu.cfs_quota_us"), "50000");
        assert_eq!(fake.read("cpu", "docker/web/cgroup.procs"), "4242");
    }

    #[test]
    fn unlimited_quota() {
        let fake = FakeHierarchy::new();
        let spec = ResourceLimitSpec {
            cpu_quota: -1,
            ..ResourceLimitSpec::new("web", "docker")
        };

        CpuGroup.apply(&data(&fake, spec)).unwrap();
        assert_eq!(fake.read("cpu", "docker/web/cpu.cfs_quota_us"), "-1");
    }

    #[test]
    fn unset_fields_are_not_written() {
        let fake = FakeHierarchy::new();
        let dir = fake.dir("cpu", "docker/web");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("cpu.shares"), "1024\n").unwrap();

        CpuGroup
            .apply(&data(&fake, ResourceLimitSpec::new("web", "docker")))
            .unwrap();

        assert_eq!(fake.read("cpu", "docker/web/cpu.shares"), "1024\n");
        assert!(!dir.join("cpu.cfs_quota_us").exists());
        assert!(!dir.join("cpu.cfs_period_us").exists());
    }

    #[test]
    fn stats_from_cpu_stat() {
        let fake = FakeHierarchy::new();
        fake.populate_accounting("web");

        let mut stats = Stats::default();
        CpuGroup
            .stats(&fake.dir("cpu", "docker/web"), &mut stats)
            .unwrap();

        assert_eq!(
            stats.cpu,
            Some(CpuStats {
                shares: 1024,
                nr_periods: 120,
                nr_throttled: 7,
                throttled_time: 5_500_000,
            })
        );
    }

    #[test]
    fn remove_deletes_directory() {
        let fake = FakeHierarchy::new();
        let dir = fake.dir("cpu", "docker/web");
        std::fs::create_dir_all(&dir).unwrap();

        CpuGroup
            .remove(&data(&fake, ResourceLimitSpec::new("web", "docker")))
            .unwrap();
        assert!(!dir.exists());
    }
}
