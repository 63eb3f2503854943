//! Mount utilities for namespace setup.
//!
//! `/proc` reflects the PID namespace of the process that mounted it, so it
//! is remounted once the process is inside the new PID namespace and root.

use std::path::Path;

use corral_common::error::{CorralError, Result};
use nix::mount::{MsFlags, mount};

use crate::platform::SyscallExt;

/// Mounts a fresh `proc` filesystem at `target`, creating the directory if
/// the root filesystem lacks it.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or `mount(2)` fails.
pub fn mount_proc(target: &Path) -> Result<()> {
    if !target.exists() {
        std::fs::create_dir_all(target).map_err(|e| CorralError::Io {
            path: target.to_path_buf(),
            source: e,
        })?;
    }
    mount(
        Some("proc"),
        target,
        Some("proc"),
        MsFlags::MS_NOSUID | MsFlags::MS_NODEV | MsFlags::MS_NOEXEC,
        None::<&str>,
    )
    .or_platform("mount")?;
    tracing::debug!(path = %target.display(), "proc mounted");
    Ok(())
}
