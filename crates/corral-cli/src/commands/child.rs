//! `corral child`: second setup stage, reached only through `run`'s re-exec.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use corral_common::constants::DEFAULT_ROOTFS;

/// Arguments for the hidden `child` command.
#[derive(Args, Debug)]
pub struct ChildArgs {
    /// Directory that becomes `/`.
    #[arg(long, default_value = DEFAULT_ROOTFS)]
    pub rootfs: PathBuf,

    /// Keep the environment for the target.
    #[arg(long)]
    pub inherit_env: bool,

    /// Executable to run once setup completes, followed by its arguments.
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "TARGET"
    )]
    pub command: Vec<String>,
}

/// Executes the `child` stage; returns only if setup or exec failed.
///
/// # Errors
///
/// Returns the first failing setup step or the exec failure.
#[cfg(target_os = "linux")]
pub fn execute(args: ChildArgs) -> anyhow::Result<ExitCode> {
    use corral_common::types::{EnvPolicy, LaunchRequest, Mode};
    use corral_runtime::setup::ChildStage;

    let (target, argv) = super::split_command(args.command);
    let request = LaunchRequest::new(Mode::Child, target, argv)?;
    let stage = ChildStage {
        rootfs: args.rootfs,
        env: if args.inherit_env {
            EnvPolicy::Inherit
        } else {
            EnvPolicy::Clear
        },
    };
    match stage.exec(&request) {
        Ok(never) => match never {},
        Err(e) => Err(e.into()),
    }
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: the child stage only exists inside Linux
/// namespaces.
#[cfg(not(target_os = "linux"))]
pub fn execute(_args: ChildArgs) -> anyhow::Result<ExitCode> {
    Err(corral_common::error::CorralError::Config {
        message: "Linux required to launch into namespaces".into(),
    }
    .into())
}
