//! Translation of kernel call failures into [`CorralError::Platform`].
//!
//! `errno` is thread-local and overwritten by the next failing call, so it
//! must be captured immediately after the call that reported failure. The
//! `nix` wrappers already do this and hand back the [`Errno`]; raw `libc`
//! calls use [`last_error`] on the very next line.

use corral_common::error::{CorralError, PlatformError, Result};
use nix::errno::Errno;

/// Resolves the kernel's description of `code`.
///
/// Falls back to `errno <code>` when the value is not a known error number.
#[must_use]
pub fn describe(code: i32) -> String {
    match Errno::from_raw(code) {
        Errno::UnknownErrno => format!("errno {code}"),
        errno => errno.desc().to_owned(),
    }
}

/// Builds a [`PlatformError`] from an [`Errno`] value.
#[must_use]
pub fn platform_error(errno: Errno) -> PlatformError {
    let code = errno as i32;
    PlatformError::new(code, describe(code))
}

/// Captures the calling thread's current `errno`.
#[must_use]
pub fn last_error() -> PlatformError {
    platform_error(Errno::last())
}

/// Wraps an [`Errno`] as the error returned by a named call.
#[must_use]
pub fn syscall_error(call: &'static str, errno: Errno) -> CorralError {
    CorralError::Platform {
        call,
        source: platform_error(errno),
    }
}

/// Maps `nix` results into the workspace error type, recording the call name.
pub trait SyscallExt<T> {
    /// Converts a failed call into [`CorralError::Platform`].
    ///
    /// # Errors
    ///
    /// Returns the wrapped error if `self` is `Err`.
    fn or_platform(self, call: &'static str) -> Result<T>;
}

impl<T> SyscallExt<T> for nix::Result<T> {
    fn or_platform(self, call: &'static str) -> Result<T> {
        self.map_err(|errno| {
            tracing::debug!(call, errno = errno as i32, "kernel call failed");
            syscall_error(call, errno)
        })
    }
}
