//! Null-terminated buffers for strings crossing the kernel boundary.
//!
//! Every path, argument, and environment entry handed to a kernel call goes
//! through [`to_cstring`]. The result is an owned [`CString`] whose length
//! excludes the trailing NUL the kernel relies on.

use std::ffi::{CString, OsStr};
use std::os::unix::ffi::OsStrExt;

use corral_common::error::{CorralError, Result};

/// Converts text into an owned, NUL-terminated buffer.
///
/// # Errors
///
/// Returns [`CorralError::Config`] if `value` contains an interior NUL byte,
/// which would silently truncate the string at the kernel boundary.
pub fn to_cstring(value: impl AsRef<OsStr>) -> Result<CString> {
    let bytes = value.as_ref().as_bytes();
    CString::new(bytes).map_err(|e| CorralError::Config {
        message: format!(
            "interior NUL byte at offset {} in {:?}",
            e.nul_position(),
            String::from_utf8_lossy(bytes)
        ),
    })
}

/// Converts every item with [`to_cstring`], stopping at the first failure.
///
/// # Errors
///
/// Returns the first conversion error.
pub fn to_cstrings<I, S>(values: I) -> Result<Vec<CString>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    values.into_iter().map(to_cstring).collect()
}
