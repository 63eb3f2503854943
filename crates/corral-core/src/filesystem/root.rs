//! Root filesystem switching via `chroot(2)`.
//!
//! The root filesystem at the given path is assumed to already exist; this
//! module never populates it.

use std::path::Path;

use corral_common::error::{CorralError, Result};
use nix::unistd::{chdir, chroot};

use crate::platform::SyscallExt;

/// Makes `new_root` the process root and moves the working directory to `/`.
///
/// Resetting the working directory matters: without it the process keeps a
/// handle on a directory outside the new root.
///
/// # Errors
///
/// Returns [`CorralError::Config`] if `new_root` is not a directory, or a
/// platform error if `chroot(2)` or `chdir(2)` fails.
pub fn change_root(new_root: &Path) -> Result<()> {
    if !new_root.is_dir() {
        return Err(CorralError::Config {
            message: format!("root filesystem not found: {}", new_root.display()),
        });
    }
    chroot(new_root).or_platform("chroot")?;
    chdir("/").or_platform("chdir")?;
    tracing::info!(root = %new_root.display(), "root changed");
    Ok(())
}
