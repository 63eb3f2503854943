//! Domain primitive types used across the corral workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CorralError, Result};

/// Unique identifier for a single launch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LaunchId(String);

impl LaunchId {
    /// Generates a random launch ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for LaunchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subcommand discriminator: the first token of a launch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Operator-facing entry: create namespaces and start the setup stage.
    Run,
    /// Second stage, reached only through the self re-exec.
    Child,
}

impl Mode {
    /// Returns the token form of the discriminator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Child => "child",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated launch request: discriminator, target executable, arguments.
///
/// The target is never empty, so a request always has at least two tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    mode: Mode,
    target: String,
    args: Vec<String>,
}

impl LaunchRequest {
    /// Builds a request for `target` with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Usage`] if `target` is empty.
    pub fn new(mode: Mode, target: impl Into<String>, args: Vec<String>) -> Result<Self> {
        let target = target.into();
        if target.is_empty() {
            return Err(CorralError::Usage {
                message: format!("{mode} requires a target executable"),
            });
        }
        Ok(Self { mode, target, args })
    }

    /// Returns the discriminator.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the target executable path.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the arguments passed after the target.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the same payload under a different discriminator.
    #[must_use]
    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            mode,
            target: self.target.clone(),
            args: self.args.clone(),
        }
    }

    /// Returns the request as command-line tokens: `[mode, target, args...]`.
    #[must_use]
    pub fn to_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.args.len() + 2);
        tokens.push(self.mode.as_str().to_owned());
        tokens.push(self.target.clone());
        tokens.extend(self.args.iter().cloned());
        tokens
    }
}

/// PID-count cgroup for one launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgroupSpec {
    /// Directory name of the group under the `pids` hierarchy.
    pub name: String,
    /// Value written to `pids.max`.
    pub pids_max: u64,
}

impl CgroupSpec {
    /// Creates a spec with an explicit group name.
    #[must_use]
    pub fn new(name: impl Into<String>, pids_max: u64) -> Self {
        Self {
            name: name.into(),
            pids_max,
        }
    }

    /// Creates a spec whose name is unique to `id`.
    #[must_use]
    pub fn for_launch(id: &LaunchId, pids_max: u64) -> Self {
        Self::new(format!("{}-{id}", crate::constants::APP_NAME), pids_max)
    }
}

/// Environment handed to the final target executable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvPolicy {
    /// Start the target with an empty environment.
    #[default]
    Clear,
    /// Pass the launcher's environment through verbatim.
    Inherit,
}
