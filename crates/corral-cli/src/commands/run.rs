//! `corral run`: launch a command in new namespaces under a pid limit.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;
use corral_common::config::LaunchConfig;
use corral_common::types::EnvPolicy;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory that becomes `/` for the command.
    #[arg(long, env = "CORRAL_ROOTFS")]
    pub rootfs: Option<PathBuf>,

    /// Hostname inside the new UTS namespace.
    #[arg(long, env = "CORRAL_HOSTNAME")]
    pub hostname: Option<String>,

    /// Maximum number of tasks in the launched tree.
    #[arg(long, env = "CORRAL_PIDS_MAX")]
    pub pids_max: Option<u64>,

    /// Do not create a pids cgroup at all.
    #[arg(long)]
    pub no_pids_limit: bool,

    /// Name of the cgroup to create instead of a generated one.
    #[arg(long)]
    pub cgroup_name: Option<String>,

    /// Keep running if the pid limit cannot be applied.
    #[arg(long)]
    pub allow_unconfined: bool,

    /// Pass the caller's environment to the command.
    #[arg(long)]
    pub inherit_env: bool,

    /// Executable to run, followed by its arguments.
    ///
    /// Everything after the executable path belongs to it, including tokens
    /// that look like `run` flags.
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "TARGET"
    )]
    pub command: Vec<String>,
}

impl RunArgs {
    /// Overlays the flags that were given onto `config`.
    fn apply(&self, config: &mut LaunchConfig) {
        if let Some(rootfs) = &self.rootfs {
            config.rootfs.clone_from(rootfs);
        }
        if let Some(hostname) = &self.hostname {
            config.hostname.clone_from(hostname);
        }
        if let Some(max) = self.pids_max {
            config.pids_max = Some(max);
        }
        if self.no_pids_limit {
            config.pids_max = None;
        }
        if let Some(name) = &self.cgroup_name {
            config.cgroup_name = Some(name.clone());
        }
        if self.allow_unconfined {
            config.allow_unconfined = true;
        }
        if self.inherit_env {
            config.env = EnvPolicy::Inherit;
        }
    }
}

/// Executes the `run` command and mirrors the child's exit status.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the launch fails
/// before the child is released.
#[cfg(target_os = "linux")]
pub fn execute(args: RunArgs, config_path: Option<&Path>) -> anyhow::Result<ExitCode> {
    use anyhow::Context;
    use corral_common::types::{LaunchRequest, Mode};
    use corral_runtime::launcher::Launcher;

    let mut config = match config_path {
        Some(path) => LaunchConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => LaunchConfig::default(),
    };
    args.apply(&mut config);

    let (target, argv) = super::split_command(args.command);
    let request = LaunchRequest::new(Mode::Run, target, argv)?;
    let exit = Launcher::new(config).run(&request)?;

    let code = exit.exit_code();
    tracing::debug!(code, "mirroring child exit status");
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX)))
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: namespaces and cgroups require Linux.
#[cfg(not(target_os = "linux"))]
pub fn execute(_args: RunArgs, _config_path: Option<&Path>) -> anyhow::Result<ExitCode> {
    Err(corral_common::error::CorralError::Config {
        message: "Linux required to launch into namespaces".into(),
    }
    .into())
}
