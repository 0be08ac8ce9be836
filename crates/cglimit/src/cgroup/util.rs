//! Reading and writing individual cgroup control files.

use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use cglimit_common::{CgError, CgResult};

/// File listing the processes that belong to a cgroup.
pub const CGROUP_PROCS: &str = "cgroup.procs";

/// Read a control file, dropping the trailing newline the kernel appends.
pub fn read_file(path: &Path) -> CgResult<String> {
    let data = std::fs::read_to_string(path).map_err(|e| CgError::file(path, e))?;
    Ok(data.strip_suffix('\n').unwrap_or(&data).to_string())
}

/// Read a control file holding a single number.
pub fn read_value<T: FromStr>(dir: &Path, file: &str) -> CgResult<T> {
    let path = dir.join(file);
    let data = read_file(&path)?;
    data.trim().parse().map_err(|_| {
        CgError::file(
            &path,
            std::io::Error::new(
                ErrorKind::InvalidData,
                format!("unexpected content {data:?}"),
            ),
        )
    })
}

/// Like [`read_value`], but `None` when the file does not exist.
///
/// Used for accounting files that only appear with optional kernel support,
/// such as swap accounting.
pub fn read_optional_value<T: FromStr>(dir: &Path, file: &str) -> CgResult<Option<T>> {
    if !dir.join(file).exists() {
        return Ok(None);
    }
    read_value(dir, file).map(Some)
}

/// Write `value` to `dir/file`. Any failure is reported as the kernel
/// rejecting the value for `controller`.
pub fn write_file(controller: &str, dir: &Path, file: &str, value: &str) -> CgResult<()> {
    let path = dir.join(file);
    std::fs::write(&path, value).map_err(|source| CgError::WriteRejected {
        controller: controller.to_string(),
        path: path.clone(),
        value: value.to_string(),
        source,
    })?;

    tracing::debug!(
        controller,
        path = %path.display(),
        value,
        "Wrote cgroup file"
    );
    Ok(())
}

/// Create a cgroup directory and its missing parents.
///
/// Another workload may create the same directory concurrently, so an
/// existing directory is success.
pub fn create_dir(path: &Path) -> CgResult<()> {
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(CgError::file(path, e)),
    }
}

/// Create `dir` if needed and move `pid` into it.
pub fn join(controller: &str, dir: &Path, pid: u32) -> CgResult<()> {
    create_dir(dir)?;
    write_file(controller, dir, CGROUP_PROCS, &pid.to_string())
}

/// Remove a cgroup directory and any child groups below it, deepest first.
///
/// Cgroup directories can only be removed with `rmdir`; the control files
/// inside vanish with them. An absent directory is success.
pub fn remove_dir(path: &Path) -> CgResult<()> {
    if !path.exists() {
        return Ok(());
    }

    for entry in walkdir::WalkDir::new(path).contents_first(true) {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            CgError::file(path, source)
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        match std::fs::remove_dir(entry.path()) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(CgError::file(entry.path(), e)),
        }
    }

    tracing::debug!(path = %path.display(), "Removed cgroup");
    Ok(())
}
