//! Mount namespace isolation.
//!
//! A fresh mount namespace starts as a copy of the parent's mount table,
//! including its propagation settings. On systemd hosts `/` is shared, so
//! mounts made inside would leak back out until the tree is made private.

use corral_common::error::Result;
use nix::mount::{MsFlags, mount};

use crate::platform::SyscallExt;

/// Recursively marks every mount under `/` as private.
///
/// Must run inside the new mount namespace, before any other mount.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
pub fn make_private() -> Result<()> {
    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_REC | MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .or_platform("mount")?;
    tracing::debug!("mount tree made private");
    Ok(())
}
