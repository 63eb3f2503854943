//! Process image replacement via `execve(2)`.
//!
//! [`ProcessBuilder`] assembles the exact vectors the kernel expects: a
//! NUL-terminated path, an argv whose slot 0 is the program path, and an
//! explicit envp. A successful [`ProcessBuilder::exec`] never returns; code
//! after it runs only on failure.

use std::convert::Infallible;
use std::ffi::{CString, OsString};
use std::os::unix::ffi::OsStrExt;

use corral_common::error::Result;
use corral_common::types::EnvPolicy;
use nix::unistd::execve;

use crate::cstring::{to_cstring, to_cstrings};
use crate::platform::SyscallExt;

/// Builder for a single `execve(2)` call.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    path: String,
    arg0: Option<String>,
    args: Vec<String>,
    env: EnvPolicy,
}

/// Kernel-ready vectors produced by [`ProcessBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    /// Executable path.
    pub path: CString,
    /// Argument vector; slot 0 is the program name.
    pub argv: Vec<CString>,
    /// Environment vector of `KEY=VALUE` entries.
    pub envp: Vec<CString>,
}

impl ProcessBuilder {
    /// Starts a builder for the executable at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            arg0: None,
            args: Vec::new(),
            env: EnvPolicy::Clear,
        }
    }

    /// Overrides argv slot 0, which otherwise repeats the path.
    #[must_use]
    pub fn arg0(mut self, arg0: impl Into<String>) -> Self {
        self.arg0 = Some(arg0.into());
        self
    }

    /// Appends arguments after slot 0.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Selects the environment passed to the new image.
    #[must_use]
    pub const fn env_policy(mut self, env: EnvPolicy) -> Self {
        self.env = env;
        self
    }

    /// Converts the request into NUL-terminated kernel vectors.
    ///
    /// # Errors
    ///
    /// Returns an error if any string contains an interior NUL byte.
    pub fn build(&self) -> Result<ExecRequest> {
        let path = to_cstring(&self.path)?;
        let arg0 = to_cstring(self.arg0.as_deref().unwrap_or(&self.path))?;

        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(arg0);
        argv.extend(to_cstrings(&self.args)?);

        let envp = match self.env {
            EnvPolicy::Clear => Vec::new(),
            EnvPolicy::Inherit => to_cstrings(std::env::vars_os().map(env_entry))?,
        };

        Ok(ExecRequest { path, argv, envp })
    }

    /// Replaces the current process image.
    ///
    /// On success this never returns. On failure the process is unchanged
    /// and the caller continues with the returned error.
    ///
    /// # Errors
    ///
    /// Returns an error if the vectors cannot be built or `execve(2)` fails
    /// (e.g. `ENOENT` for a missing path, `EACCES` for a non-executable one).
    pub fn exec(&self) -> Result<Infallible> {
        let req = self.build()?;
        tracing::debug!(
            path = %self.path,
            argc = req.argv.len(),
            envc = req.envp.len(),
            "replacing process image"
        );
        execve(&req.path, &req.argv, &req.envp).or_platform("execve")
    }
}

fn env_entry((key, value): (OsString, OsString)) -> OsString {
    let mut entry = OsString::with_capacity(key.as_bytes().len() + value.as_bytes().len() + 1);
    entry.push(key);
    entry.push("=");
    entry.push(value);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_common::error::CorralError;

    fn as_strs(v: &[CString]) -> Vec<&str> {
        v.iter().map(|c| c.to_str().unwrap()).collect()
    }

    #[test]
    fn argv_starts_with_path_then_args() {
        let req = ProcessBuilder::new("/bin/echo")
            .args(["hello", "world"])
            .build()
            .unwrap();
        assert_eq!(req.path.to_str().unwrap(), "/bin/echo");
        assert_eq!(as_strs(&req.argv), ["/bin/echo", "hello", "world"]);
    }

    #[test]
    fn no_args_yields_single_slot_argv() {
        let req = ProcessBuilder::new("/bin/true").build().unwrap();
        assert_eq!(as_strs(&req.argv), ["/bin/true"]);
    }

    #[test]
    fn arg0_override_keeps_path() {
        let req = ProcessBuilder::new("/proc/self/exe")
            .arg0("corral")
            .args(["child", "--", "/bin/sh"])
            .build()
            .unwrap();
        assert_eq!(req.path.to_str().unwrap(), "/proc/self/exe");
        assert_eq!(as_strs(&req.argv), ["corral", "child", "--", "/bin/sh"]);
    }

    #[test]
    fn clear_policy_yields_empty_environment() {
        let req = ProcessBuilder::new("/bin/env").build().unwrap();
        assert!(req.envp.is_empty());
    }

    #[test]
    fn inherit_policy_copies_environment() {
        let req = ProcessBuilder::new("/bin/env")
            .env_policy(EnvPolicy::Inherit)
            .build()
            .unwrap();
        assert_eq!(req.envp.len(), std::env::vars_os().count());
        assert!(req.envp.iter().all(|e| e.as_bytes().contains(&b'=')));
    }

    #[test]
    fn interior_nul_in_argument_fails_build() {
        let err = ProcessBuilder::new("/bin/echo")
            .args(["bad\0arg"])
            .build()
            .unwrap_err();
        assert!(matches!(err, CorralError::Config { .. }));
    }

    #[test]
    fn exec_of_missing_path_returns_enoent() {
        let err = ProcessBuilder::new("/nonexistent/corral-test-binary")
            .exec()
            .unwrap_err();
        assert_eq!(err.errno(), Some(libc::ENOENT));
        assert!(matches!(err, CorralError::Platform { call: "execve", .. }));
        assert!(err.to_string().contains("No such file or directory"));
    }
}
