//! Fake cgroup hierarchy on a temporary directory.

use std::path::PathBuf;

use tempfile::TempDir;

use super::Hierarchy;

pub struct FakeHierarchy {
    pub tmp: TempDir,
    pub root: PathBuf,
    pub hierarchy: Hierarchy,
}

impl FakeHierarchy {
    /// `cpu`, `memory` and `cpuset` mounted under one root, with the cpuset
    /// root masks set to `0-3` / `0` like a four CPU, single node host.
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("cgroup");

        for group in ["cpu", "memory", "cpuset"] {
            std::fs::create_dir_all(root.join(group)).unwrap();
        }
        std::fs::write(root.join("cpuset/cpuset.cpus"), "0-3\n").unwrap();
        std::fs::write(root.join("cpuset/cpuset.mems"), "0\n").unwrap();

        let mountinfo = format!(
            "25 0 8:1 / / rw,relatime shared:1 - ext4 /dev/sda1 rw\n\
             30 25 0:26 / {root}/cpu rw,nosuid,nodev,noexec,relatime shared:11 - cgroup cgroup rw,cpu,cpuacct\n\
             31 25 0:27 / {root}/cpuset rw,nosuid,nodev,noexec,relatime shared:12 - cgroup cgroup rw,cpuset\n\
             32 25 0:28 / {root}/memory rw,nosuid,nodev,noexec,relatime shared:13 - cgroup cgroup rw,memory\n",
            root = root.display()
        );
        std::fs::write(tmp.path().join("mountinfo"), mountinfo).unwrap();
        std::fs::write(
            tmp.path().join("init_cgroup"),
            "6:cpuset:/\n4:cpu,cpuacct:/\n9:memory:/\n",
        )
        .unwrap();

        let hierarchy = Hierarchy::new()
            .with_mountinfo(tmp.path().join("mountinfo"))
            .with_init_cgroup(tmp.path().join("init_cgroup"));

        Self {
            tmp,
            root,
            hierarchy,
        }
    }

    pub fn mountinfo(&self) -> PathBuf {
        self.tmp.path().join("mountinfo")
    }

    pub fn init_cgroup(&self) -> PathBuf {
        self.tmp.path().join("init_cgroup")
    }

    /// `root/group/rel`.
    pub fn dir(&self, group: &str, rel: &str) -> PathBuf {
        self.root.join(group).join(rel)
    }

    pub fn read(&self, group: &str, rel: &str) -> String {
        std::fs::read_to_string(self.dir(group, rel)).unwrap()
    }

    /// Write accounting files a live kernel would provide for `docker/<name>`.
    pub fn populate_accounting(&self, name: &str) {
        let cpu = self.dir("cpu", &format!("docker/{name}"));
        std::fs::create_dir_all(&cpu).unwrap();
        std::fs::write(cpu.join("cpu.shares"), "1024\n").unwrap();
        std::fs::write(
            cpu.join("cpu.stat"),
            "nr_periods 120\nnr_throttled 7\nthrottled_time 5500000\n",
        )
        .unwrap();

        let memory = self.dir("memory", &format!("docker/{name}"));
        std::fs::create_dir_all(&memory).unwrap();
        std::fs::write(memory.join("memory.usage_in_bytes"), "1048576\n").unwrap();
        std::fs::write(memory.join("memory.max_usage_in_bytes"), "2097152\n").unwrap();
        std::fs::write(memory.join("memory.failcnt"), "0\n").unwrap();
        std::fs::write(memory.join("memory.limit_in_bytes"), "536870912\n").unwrap();
        std::fs::write(
            memory.join("memory.stat"),
            "cache 4096\nrss 1044480\nmapped_file 0\n",
        )
        .unwrap();
    }
}
