//! `pids` controller files.
//!
//! Manages `pids.max`, the v1 `notify_on_release` flag, and v2 controller
//! delegation through `cgroup.subtree_control`.

use std::path::Path;

use corral_common::error::{CorralError, Result};

/// Writes `value` to the control file `name` inside `cgroup_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_control(cgroup_path: &Path, name: &str, value: &str) -> Result<()> {
    let file = cgroup_path.join(name);
    std::fs::write(&file, value).map_err(|e| CorralError::Io {
        path: file,
        source: e,
    })
}

/// Sets the maximum number of tasks in the group.
///
/// Forks past the limit fail with `EAGAIN` in the forking process.
///
/// # Errors
///
/// Returns an error if writing to `pids.max` fails.
pub fn set_pids_max(cgroup_path: &Path, max: u64) -> Result<()> {
    write_control(cgroup_path, "pids.max", &max.to_string())?;
    tracing::debug!(max, "pids.max set");
    Ok(())
}

/// Asks the v1 kernel to reclaim the group once its last task exits.
///
/// # Errors
///
/// Returns an error if writing to `notify_on_release` fails.
pub fn set_notify_on_release(cgroup_path: &Path) -> Result<()> {
    write_control(cgroup_path, "notify_on_release", "1")
}

/// Enables the `pids` controller for children of the v2 root.
///
/// Best effort: the controller is usually already delegated, and a
/// missing one surfaces as a failed `pids.max` write right after.
pub fn enable_controller(root: &Path) {
    if let Err(e) = write_control(root, "cgroup.subtree_control", "+pids") {
        tracing::debug!(error = %e, "could not enable pids controller");
    }
}
