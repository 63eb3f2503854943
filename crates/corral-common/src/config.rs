//! Launch configuration model.
//!
//! Values come from [`LaunchConfig::default`], optionally overlaid by a JSON
//! file, and finally by command-line flags in the CLI crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{CorralError, Result};
use crate::types::EnvPolicy;

/// Everything a launch needs besides the command itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Directory that becomes `/` for the target.
    pub rootfs: PathBuf,
    /// Hostname set inside the UTS namespace.
    pub hostname: String,
    /// Value for `pids.max`; `None` skips the cgroup entirely.
    pub pids_max: Option<u64>,
    /// Mount point of the cgroup hierarchy.
    pub cgroup_root: PathBuf,
    /// Explicit cgroup name; generated per launch when absent.
    pub cgroup_name: Option<String>,
    /// Continue without confinement when the cgroup cannot be applied.
    pub allow_unconfined: bool,
    /// Environment given to the target executable.
    pub env: EnvPolicy,
    /// Size in bytes of the cloned child's stack.
    pub stack_size: usize,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            rootfs: PathBuf::from(constants::DEFAULT_ROOTFS),
            hostname: constants::DEFAULT_HOSTNAME.to_owned(),
            pids_max: Some(constants::DEFAULT_PIDS_MAX),
            cgroup_root: PathBuf::from(constants::CGROUP_ROOT),
            cgroup_name: None,
            allow_unconfined: false,
            env: EnvPolicy::Clear,
            stack_size: constants::DEFAULT_STACK_SIZE,
        }
    }
}

impl LaunchConfig {
    /// Loads a configuration from a JSON file; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`LaunchConfig::validate`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CorralError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that the kernel would otherwise reject later.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.hostname.is_empty() || self.hostname.len() > 64 {
            return Err(CorralError::Config {
                message: format!("hostname must be 1-64 bytes, got {:?}", self.hostname),
            });
        }
        if !self.rootfs.is_absolute() {
            return Err(CorralError::Config {
                message: format!("rootfs must be absolute: {}", self.rootfs.display()),
            });
        }
        if self.pids_max == Some(0) {
            return Err(CorralError::Config {
                message: "pids_max must be at least 1".into(),
            });
        }
        if let Some(name) = &self.cgroup_name {
            if name.is_empty() || name.contains('/') || name == "." || name == ".." {
                return Err(CorralError::Config {
                    message: format!("invalid cgroup name {name:?}"),
                });
            }
        }
        if self.stack_size < 64 * 1024 {
            return Err(CorralError::Config {
                message: format!("stack_size {} is below 64 KiB", self.stack_size),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = LaunchConfig::default();
        config.validate().unwrap();
        assert_eq!(config.rootfs, PathBuf::from("/"));
        assert_eq!(config.pids_max, Some(20));
        assert_eq!(config.env, EnvPolicy::Clear);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("corral.json");
        std::fs::write(&path, r#"{ "hostname": "box", "env": "inherit" }"#).unwrap();

        let config = LaunchConfig::from_file(&path).expect("load");
        assert_eq!(config.hostname, "box");
        assert_eq!(config.env, EnvPolicy::Inherit);
        assert_eq!(config.pids_max, Some(20));
        assert_eq!(config.cgroup_root, PathBuf::from("/sys/fs/cgroup"));
    }

    #[test]
    fn null_pids_max_disables_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("corral.json");
        std::fs::write(&path, r#"{ "pids_max": null }"#).unwrap();

        let config = LaunchConfig::from_file(&path).expect("load");
        assert_eq!(config.pids_max, None);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LaunchConfig::from_file(Path::new("/nonexistent/corral.json")).unwrap_err();
        assert!(matches!(err, CorralError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_serialization_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("corral.json");
        std::fs::write(&path, "{ hostname = box }").unwrap();

        let err = LaunchConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CorralError::Serialization { .. }));
    }

    #[test]
    fn relative_rootfs_is_rejected() {
        let config = LaunchConfig {
            rootfs: PathBuf::from("rootfs"),
            ..LaunchConfig::default()
        };
        assert!(matches!(config.validate(), Err(CorralError::Config { .. })));
    }

    #[test]
    fn zero_pids_max_is_rejected() {
        let config = LaunchConfig {
            pids_max: Some(0),
            ..LaunchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn cgroup_name_cannot_escape_hierarchy() {
        let config = LaunchConfig {
            cgroup_name: Some("../escape".into()),
            ..LaunchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_hostname_is_rejected() {
        let config = LaunchConfig {
            hostname: "h".repeat(65),
            ..LaunchConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
