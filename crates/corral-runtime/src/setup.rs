//! Namespace setup inside the launched child.
//!
//! Setup runs in two stages:
//!
//! 1. **initial**: the clone entry. Sets the hostname, makes the mount tree
//!    private, then re-executes `/proc/self/exe child ...`. The host
//!    filesystem is still visible here, so the launcher binary and its
//!    loader resolve normally.
//! 2. **child**: the re-executed image. Changes root, mounts `/proc` for
//!    the new PID namespace, and execs the target.
//!
//! Neither stage rolls anything back on failure: nothing outside the
//! child's own namespaces has been touched, and the target never started.

use std::convert::Infallible;
use std::path::{Path, PathBuf};

use corral_common::config::LaunchConfig;
use corral_common::constants::{BIN_NAME, PROC_MOUNT, SELF_EXE, SETUP_FAILURE_EXIT};
use corral_common::error::{CorralError, Result};
use corral_common::types::{EnvPolicy, LaunchRequest, Mode};
use corral_core::filesystem::{mount::mount_proc, root::change_root};
use corral_core::namespace::{mount::make_private, uts};
use corral_core::process::ProcessBuilder;

/// State carried into the clone entry function.
#[derive(Debug, Clone)]
pub struct ContainerSetup {
    config: LaunchConfig,
    request: LaunchRequest,
}

impl ContainerSetup {
    /// Captures the configuration and request the child will need.
    #[must_use]
    pub const fn new(config: LaunchConfig, request: LaunchRequest) -> Self {
        Self { config, request }
    }

    /// Clone entry point: runs [`ContainerSetup::initial`] and turns a
    /// failure into the child's exit status.
    pub fn entry(&self) -> isize {
        match self.initial() {
            Ok(never) => match never {},
            Err(e) => {
                tracing::error!(error = %e, "namespace setup failed");
                SETUP_FAILURE_EXIT as isize
            }
        }
    }

    /// First stage: hostname, private mounts, then re-exec into `child` mode.
    ///
    /// The re-exec always inherits the environment so logging settings
    /// reach the second stage; the target's environment is decided there.
    ///
    /// # Errors
    ///
    /// Returns the first failing step; on success this never returns.
    pub fn initial(&self) -> Result<Infallible> {
        uts::set_hostname(&self.config.hostname)?;
        make_private()?;

        let argv = child_argv(&self.config, &self.request)?;
        tracing::debug!(?argv, "re-executing into child stage");
        ProcessBuilder::new(SELF_EXE)
            .arg0(BIN_NAME)
            .args(argv)
            .env_policy(EnvPolicy::Inherit)
            .exec()
    }
}

/// Builds the argument vector for the self re-exec.
///
/// The discriminator is rewritten to `child`; the target and its arguments
/// follow a `--` separator unchanged.
///
/// # Errors
///
/// Returns [`CorralError::Config`] if the root filesystem path is not UTF-8.
pub fn child_argv(config: &LaunchConfig, request: &LaunchRequest) -> Result<Vec<String>> {
    let rootfs = config.rootfs.to_str().ok_or_else(|| CorralError::Config {
        message: format!("rootfs path is not UTF-8: {}", config.rootfs.display()),
    })?;

    let mut tokens = request.with_mode(Mode::Child).to_tokens();
    let payload = tokens.split_off(1);

    tokens.push("--rootfs".to_owned());
    tokens.push(rootfs.to_owned());
    if config.env == EnvPolicy::Inherit {
        tokens.push("--inherit-env".to_owned());
    }
    tokens.push("--".to_owned());
    tokens.extend(payload);
    Ok(tokens)
}

/// Settings the second stage receives on its command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildStage {
    /// Directory that becomes `/`.
    pub rootfs: PathBuf,
    /// Environment for the target.
    pub env: EnvPolicy,
}

impl ChildStage {
    /// Second stage: change root, mount `/proc`, exec the target.
    ///
    /// Refuses to run unless this process is PID 1 of a new PID namespace,
    /// which is only true when reached through `run`.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Usage`] when invoked directly, or the first
    /// failing step. On success this never returns.
    pub fn exec(&self, request: &LaunchRequest) -> Result<Infallible> {
        ensure_namespace_init()?;

        change_root(&self.rootfs)?;
        mount_proc(Path::new(PROC_MOUNT))?;
        tracing::debug!(program = request.target(), "setup complete");

        ProcessBuilder::new(request.target())
            .args(request.args().iter().cloned())
            .env_policy(self.env)
            .exec()
    }
}

fn ensure_namespace_init() -> Result<()> {
    let pid = nix::unistd::getpid();
    if pid.as_raw() != 1 {
        return Err(CorralError::Usage {
            message: format!(
                "child is an internal stage of run and must be PID 1 of a new PID namespace (pid is {pid})"
            ),
        });
    }
    Ok(())
}
