//! UTS namespace isolation.
//!
//! Lets the launched process have its own hostname without touching the
//! host's.

use corral_common::error::Result;

use crate::platform::SyscallExt;

/// Sets the hostname inside the current UTS namespace.
///
/// # Errors
///
/// Returns an error if `sethostname(2)` fails, e.g. `EPERM` outside a new
/// UTS namespace without `CAP_SYS_ADMIN`.
pub fn set_hostname(hostname: &str) -> Result<()> {
    nix::unistd::sethostname(hostname).or_platform("sethostname")?;
    tracing::debug!(hostname, "hostname set");
    Ok(())
}
