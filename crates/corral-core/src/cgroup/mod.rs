//! PID-count confinement via the cgroup `pids` controller.
//!
//! Supports both hierarchies found in the wild:
//! - **v1**: a dedicated `pids` controller mount at `<root>/pids`, where the
//!   kernel reclaims an empty group when `notify_on_release` is set.
//! - **v2**: the unified hierarchy at `<root>`, which has no auto-release
//!   file; the owner removes the group with [`PidsCgroup::destroy`].

pub mod pids;

use std::path::{Path, PathBuf};

use corral_common::error::{CorralError, Result};
use corral_common::types::CgroupSpec;

/// Which cgroup hierarchy hosts the `pids` controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CgroupLayout {
    /// Legacy per-controller hierarchy; holds the `pids` controller mount.
    V1 {
        /// Path of the `pids` controller mount.
        controller_root: PathBuf,
    },
    /// Unified hierarchy.
    V2 {
        /// Mount point of the unified hierarchy.
        root: PathBuf,
    },
}

impl CgroupLayout {
    /// Detects the hierarchy mounted under `mount_root` (normally `/sys/fs/cgroup`).
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Config`] if neither a v1 `pids` controller nor a
    /// v2 unified hierarchy is present.
    pub fn detect(mount_root: &Path) -> Result<Self> {
        let v1 = mount_root.join("pids");
        if v1.is_dir() {
            tracing::debug!(root = %v1.display(), "using cgroup v1 pids controller");
            return Ok(Self::V1 { controller_root: v1 });
        }
        if mount_root.join("cgroup.controllers").is_file() {
            tracing::debug!(root = %mount_root.display(), "using cgroup v2 unified hierarchy");
            return Ok(Self::V2 {
                root: mount_root.to_path_buf(),
            });
        }
        Err(CorralError::Config {
            message: format!(
                "no pids cgroup controller found under {}",
                mount_root.display()
            ),
        })
    }

    /// Returns the directory a group named `name` lives in.
    #[must_use]
    pub fn group_path(&self, name: &str) -> PathBuf {
        match self {
            Self::V1 { controller_root } => controller_root.join(name),
            Self::V2 { root } => root.join(name),
        }
    }
}

/// Handle to one launch's `pids` cgroup.
#[derive(Debug)]
pub struct PidsCgroup {
    path: PathBuf,
    layout: CgroupLayout,
}

impl PidsCgroup {
    /// Creates (or reuses) the group directory and writes its limit.
    ///
    /// Creation is idempotent: an existing group with the same name is
    /// reconfigured in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or a control
    /// file cannot be written.
    pub fn create(layout: &CgroupLayout, spec: &CgroupSpec) -> Result<Self> {
        if let CgroupLayout::V2 { root } = layout {
            pids::enable_controller(root);
        }

        let path = layout.group_path(&spec.name);
        std::fs::create_dir_all(&path).map_err(|e| CorralError::Io {
            path: path.clone(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), "cgroup created");

        pids::set_pids_max(&path, spec.pids_max)?;
        if matches!(layout, CgroupLayout::V1 { .. }) {
            pids::set_notify_on_release(&path)?;
        }

        Ok(Self {
            path,
            layout: layout.clone(),
        })
    }

    /// Returns the group directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds a process to this cgroup by writing its PID.
    ///
    /// Descendants forked afterwards inherit the membership.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `cgroup.procs` fails.
    pub fn add_process(&self, pid: u32) -> Result<()> {
        pids::write_control(&self.path, "cgroup.procs", &pid.to_string())?;
        tracing::debug!(pid, path = %self.path.display(), "added process to cgroup");
        Ok(())
    }

    /// Removes the group directory once it has no members.
    ///
    /// A group that is already gone (v1 auto-release) is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if `rmdir(2)` fails, e.g. `EBUSY` while members remain.
    pub fn destroy(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        // Control files cannot be unlinked; rmdir on the group is the only way.
        std::fs::remove_dir(&self.path).map_err(|e| CorralError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        tracing::info!(path = %self.path.display(), "cgroup destroyed");
        Ok(())
    }

    /// Whether the kernel reclaims this group by itself once it is empty.
    #[must_use]
    pub const fn auto_release(&self) -> bool {
        matches!(self.layout, CgroupLayout::V1 { .. })
    }
}

/// Creates the group described by `spec` and enrolls `pid` in it.
///
/// # Errors
///
/// Returns an error if creation or enrollment fails. Nothing is retried;
/// a group whose enrollment failed is removed again before returning.
pub fn apply(layout: &CgroupLayout, spec: &CgroupSpec, pid: u32) -> Result<PidsCgroup> {
    let group = PidsCgroup::create(layout, spec)?;
    if let Err(e) = group.add_process(pid) {
        if let Err(cleanup) = group.destroy() {
            tracing::warn!(error = %cleanup, path = %group.path().display(), "could not remove cgroup");
        }
        return Err(e);
    }
    tracing::info!(pid, pids_max = spec.pids_max, name = %spec.name, "pid limit applied");
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).expect("read control file")
    }

    fn v1_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("pids")).expect("mkdir pids");
        dir
    }

    fn v2_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("cgroup.controllers"), "cpu memory pids\n")
            .expect("write controllers");
        dir
    }

    #[test]
    fn detects_v1_controller_mount() {
        let dir = v1_root();
        let layout = CgroupLayout::detect(dir.path()).expect("detect");
        assert_eq!(
            layout,
            CgroupLayout::V1 {
                controller_root: dir.path().join("pids")
            }
        );
    }

    #[test]
    fn detects_v2_unified_hierarchy() {
        let dir = v2_root();
        let layout = CgroupLayout::detect(dir.path()).expect("detect");
        assert_eq!(
            layout,
            CgroupLayout::V2 {
                root: dir.path().to_path_buf()
            }
        );
    }

    #[test]
    fn missing_hierarchy_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = CgroupLayout::detect(dir.path()).unwrap_err();
        assert!(matches!(err, CorralError::Config { .. }));
    }

    #[test]
    fn v1_group_gets_limit_and_release_flag() {
        let dir = v1_root();
        let layout = CgroupLayout::detect(dir.path()).unwrap();
        let group = PidsCgroup::create(&layout, &CgroupSpec::new("box", 20)).expect("create");

        assert_eq!(group.path(), dir.path().join("pids/box"));
        assert_eq!(read(&group.path().join("pids.max")), "20");
        assert_eq!(read(&group.path().join("notify_on_release")), "1");
        assert!(group.auto_release());
    }

    #[test]
    fn v2_group_has_no_release_flag() {
        let dir = v2_root();
        let layout = CgroupLayout::detect(dir.path()).unwrap();
        let group = PidsCgroup::create(&layout, &CgroupSpec::new("box", 5)).expect("create");

        assert_eq!(group.path(), dir.path().join("box"));
        assert_eq!(read(&group.path().join("pids.max")), "5");
        assert!(!group.path().join("notify_on_release").exists());
        assert!(!group.auto_release());
    }

    #[test]
    fn v2_create_enables_pids_controller() {
        let dir = v2_root();
        let layout = CgroupLayout::detect(dir.path()).unwrap();
        let _group = PidsCgroup::create(&layout, &CgroupSpec::new("box", 5)).expect("create");
        assert_eq!(read(&dir.path().join("cgroup.subtree_control")), "+pids");
    }

    #[test]
    fn create_is_idempotent() {
        let dir = v1_root();
        let layout = CgroupLayout::detect(dir.path()).unwrap();
        let _first = PidsCgroup::create(&layout, &CgroupSpec::new("box", 20)).expect("first");
        let second = PidsCgroup::create(&layout, &CgroupSpec::new("box", 7)).expect("second");
        assert_eq!(read(&second.path().join("pids.max")), "7");
    }

    #[test]
    fn apply_enrolls_member_pid() {
        let dir = v1_root();
        let layout = CgroupLayout::detect(dir.path()).unwrap();
        let group = apply(&layout, &CgroupSpec::new("box", 1), 4242).expect("apply");
        assert_eq!(read(&group.path().join("cgroup.procs")), "4242");
        assert_eq!(read(&group.path().join("pids.max")), "1");
    }

    #[test]
    fn apply_fails_when_hierarchy_is_not_a_directory() {
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        let blocked = CgroupLayout::V1 {
            controller_root: file.path().to_path_buf(),
        };
        let err = apply(&blocked, &CgroupSpec::new("box", 1), 1).unwrap_err();
        assert!(matches!(err, CorralError::Io { .. }));
    }

    #[test]
    fn failed_enrollment_reports_the_procs_write() {
        let dir = v1_root();
        let layout = CgroupLayout::detect(dir.path()).unwrap();
        let procs = layout.group_path("box").join("cgroup.procs");
        std::fs::create_dir_all(&procs).unwrap();

        let err = apply(&layout, &CgroupSpec::new("box", 1), 4242).unwrap_err();
        let CorralError::Io { path, .. } = err else {
            unreachable!("enrollment fails with an I/O error");
        };
        assert_eq!(path, procs);
    }

    #[test]
    #[ignore = "requires root and a mounted cgroup hierarchy"]
    fn failed_enrollment_removes_group() {
        let layout = CgroupLayout::detect(Path::new(corral_common::constants::CGROUP_ROOT))
            .expect("cgroup hierarchy");
        let spec = CgroupSpec::for_launch(&corral_common::types::LaunchId::generate(), 1);

        // No such pid: the kernel rejects the cgroup.procs write.
        assert!(apply(&layout, &spec, u32::MAX >> 1).is_err());
        assert!(!layout.group_path(&spec.name).exists());
    }

    #[test]
    fn group_path_follows_layout() {
        let v1 = CgroupLayout::V1 {
            controller_root: PathBuf::from("/sys/fs/cgroup/pids"),
        };
        let v2 = CgroupLayout::V2 {
            root: PathBuf::from("/sys/fs/cgroup"),
        };
        assert_eq!(v1.group_path("box"), PathBuf::from("/sys/fs/cgroup/pids/box"));
        assert_eq!(v2.group_path("box"), PathBuf::from("/sys/fs/cgroup/box"));
    }

    #[test]
    fn destroy_of_released_group_is_ok() {
        let dir = v1_root();
        let layout = CgroupLayout::detect(dir.path()).unwrap();
        let group = PidsCgroup::create(&layout, &CgroupSpec::new("box", 20)).unwrap();
        std::fs::remove_dir_all(group.path()).unwrap();
        group.destroy().expect("destroy");
    }
}
