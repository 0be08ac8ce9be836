//! Discovery of cgroup v1 mount points and init subpaths.

use std::path::{Path, PathBuf};

use cglimit_common::{CgError, CgResult};

/// Find where the cgroup v1 hierarchy for `subsystem` is mounted.
///
/// Lines look like
/// `30 25 0:26 / /sys/fs/cgroup/cpu,cpuacct rw,relatime shared:11 - cgroup cgroup rw,cpu,cpuacct`;
/// the mount point is the fifth field and the subsystems are in the super
/// options after the ` - ` separator.
pub fn find_mountpoint(mountinfo: &Path, subsystem: &str) -> CgResult<Option<PathBuf>> {
    let data =
        std::fs::read_to_string(mountinfo).map_err(|e| CgError::file(mountinfo, e))?;
    Ok(parse_mountpoint(&data, subsystem))
}

fn parse_mountpoint(data: &str, subsystem: &str) -> Option<PathBuf> {
    data.lines().find_map(|line| {
        let (pre, post) = line.split_once(" - ")?;
        let mountpoint = pre.split(' ').nth(4)?;

        let mut post = post.split(' ');
        let fs_type = post.next()?;
        let super_opts = post.nth(1)?;
        if fs_type != "cgroup" {
            return None;
        }

        super_opts
            .split(',')
            .any(|opt| opt == subsystem)
            .then(|| PathBuf::from(unescape(mountpoint)))
    })
}

// mountinfo escapes space, tab, newline and backslash as octal.
fn unescape(field: &str) -> String {
    field
        .replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

/// Cgroup path of the init process for `subsystem`, e.g. `/` or `/init.scope`.
///
/// Returns `None` when the subsystem is not listed, which means it is not
/// mounted on this host.
pub fn init_subpath(init_cgroup: &Path, subsystem: &str) -> CgResult<Option<String>> {
    let data =
        std::fs::read_to_string(init_cgroup).map_err(|e| CgError::file(init_cgroup, e))?;
    Ok(parse_init_subpath(&data, subsystem))
}

fn parse_init_subpath(data: &str, subsystem: &str) -> Option<String> {
    // Expected line format: `4:cpu,cpuacct:/`
    data.lines().find_map(|line| {
        let mut parts = line.splitn(3, ':');
        let _id = parts.next()?;
        let subsystems = parts.next()?;
        let path = parts.next()?;
        subsystems
            .split(',')
            .any(|s| s == subsystem)
            .then(|| path.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUNTINFO: &str = "\
25 0 8:1 / / rw,relatime shared:1 - ext4 /dev/sda1 rw
30 25 0:26 / /sys/fs/cgroup/cpu,cpuacct rw,nosuid,nodev,noexec,relatime shared:11 - cgroup cgroup rw,cpu,cpuacct
31 25 0:27 / /sys/fs/cgroup/cpuset rw,nosuid,nodev,noexec,relatime shared:12 - cgroup cgroup rw,cpuset
32 25 0:28 / /sys/fs/cgroup/memory rw,nosuid,nodev,noexec,relatime shared:13 - cgroup cgroup rw,memory
33 25 0:29 / /sys/fs/cgroup/unified rw,nosuid,nodev,noexec,relatime shared:14 - cgroup2 cgroup2 rw
34 25 0:30 / /mnt/with\\040space rw - cgroup cgroup rw,freezer
";

    #[test]
    fn finds_comounted_cpu() {
        assert_eq!(
            parse_mountpoint(MOUNTINFO, "cpu"),
            Some(PathBuf::from("/sys/fs/cgroup/cpu,cpuacct"))
        );
        assert_eq!(
            parse_mountpoint(MOUNTINFO, "cpuacct"),
            Some(PathBuf::from("/sys/fs/cgroup/cpu,cpuacct"))
        );
    }

    #[test]
    fn cpu_does_not_match_cpuset() {
        assert_eq!(
            parse_mountpoint(MOUNTINFO, "cpuset"),
            Some(PathBuf::from("/sys/fs/cgroup/cpuset"))
        );
        assert_eq!(parse_mountpoint("31 25 0:27 / /cg/cpuset rw - cgroup cgroup rw,cpuset", "cpu"), None);
    }

    #[test]
    fn ignores_cgroup2_and_unknown() {
        assert_eq!(parse_mountpoint(MOUNTINFO, "blkio"), None);
        assert_eq!(parse_mountpoint(MOUNTINFO, "rw"), None);
    }

    #[test]
    fn unescapes_mountpoint() {
        assert_eq!(
            parse_mountpoint(MOUNTINFO, "freezer"),
            Some(PathBuf::from("/mnt/with space"))
        );
    }

    #[test]
    fn init_subpaths() {
        let data = "12:pids:/init.scope\n6:cpuset:/\n4:cpu,cpuacct:/system.slice\n1:name=systemd:/init.scope\n";
        assert_eq!(parse_init_subpath(data, "cpu").as_deref(), Some("/system.slice"));
        assert_eq!(parse_init_subpath(data, "cpuset").as_deref(), Some("/"));
        assert_eq!(parse_init_subpath(data, "memory"), None);
    }

    #[test]
    fn missing_mountinfo_is_file_error() {
        let err = find_mountpoint(Path::new("/nonexistent/mountinfo"), "cpu").unwrap_err();
        assert!(matches!(err, CgError::File { .. }));
    }
}
