//! Parent side of `run`.
//!
//! Sequence:
//! 1. validate configuration and locate the cgroup hierarchy (no child yet)
//! 2. clone the child into new namespaces; it blocks on its readiness gate
//! 3. enroll the child PID in its `pids` cgroup
//! 4. release the child and wait for it
//! 5. remove the cgroup where the kernel does not reclaim it
//!
//! Step 3 completes before the child does any work, so no process in the
//! launched tree ever runs unconfined unless `allow_unconfined` is set and
//! enrollment failed.

use corral_common::config::LaunchConfig;
use corral_common::error::{CorralError, Result};
use corral_common::types::{CgroupSpec, LaunchId, LaunchRequest, Mode};
use corral_core::cgroup::{self, CgroupLayout, PidsCgroup};
use corral_core::namespace::{self, ChildExit, ChildHandle, NamespaceFlagSet};

use crate::setup::ContainerSetup;

/// Runs one request inside new namespaces.
///
/// The child re-executes `/proc/self/exe`, so the running binary must route
/// a leading `child` token to [`crate::setup::ChildStage`].
#[derive(Debug, Clone)]
pub struct Launcher {
    config: LaunchConfig,
    flags: NamespaceFlagSet,
}

impl Launcher {
    /// Creates a launcher that uses the full namespace set.
    #[must_use]
    pub const fn new(config: LaunchConfig) -> Self {
        Self {
            config,
            flags: NamespaceFlagSet::all(),
        }
    }

    /// Launches `request` and blocks until the child exits.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid request or configuration (before any
    /// kernel call), a failed clone, or a cgroup failure when confinement
    /// is required. Child failures are reported through [`ChildExit`].
    pub fn run(&self, request: &LaunchRequest) -> Result<ChildExit> {
        if request.mode() != Mode::Run {
            return Err(CorralError::Usage {
                message: format!("launcher expects a run request, got {}", request.mode()),
            });
        }
        self.config.validate()?;

        let id = LaunchId::generate();
        let confinement = self.prepare_cgroup(&id)?;
        tracing::info!(
            id = %id,
            program = request.target(),
            args = ?request.args(),
            rootfs = %self.config.rootfs.display(),
            "launching"
        );

        let setup = ContainerSetup::new(self.config.clone(), request.clone());
        let mut child = namespace::launch(self.flags, self.config.stack_size, move || setup.entry())?;

        let group = match confinement {
            Some((layout, spec)) => match self.confine(&child, &layout, &spec) {
                Ok(group) => group,
                Err(e) => {
                    let status = child.wait();
                    tracing::debug!(?status, "reaped unconfined child");
                    return Err(e);
                }
            },
            None => None,
        };

        if let Err(e) = child.release() {
            tracing::warn!(error = %e, "child exited before release");
        }
        let exit = finish(child.wait(), group.as_ref())?;
        tracing::info!(id = %id, ?exit, "child exited");
        Ok(exit)
    }

    /// Resolves the cgroup layout before cloning so a missing hierarchy
    /// fails without creating a child.
    fn prepare_cgroup(&self, id: &LaunchId) -> Result<Option<(CgroupLayout, CgroupSpec)>> {
        let Some(pids_max) = self.config.pids_max else {
            tracing::debug!("pid limit disabled");
            return Ok(None);
        };
        let spec = match &self.config.cgroup_name {
            Some(name) => CgroupSpec::new(name.clone(), pids_max),
            None => CgroupSpec::for_launch(id, pids_max),
        };
        match CgroupLayout::detect(&self.config.cgroup_root) {
            Ok(layout) => Ok(Some((layout, spec))),
            Err(e) if self.config.allow_unconfined => {
                tracing::warn!(error = %e, "running without pid limit");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Enrolls the child; `Ok(None)` means enrollment failed but the launch
    /// may continue unconfined.
    fn confine(
        &self,
        child: &ChildHandle,
        layout: &CgroupLayout,
        spec: &CgroupSpec,
    ) -> Result<Option<PidsCgroup>> {
        let pid = child.pid().as_raw().unsigned_abs();
        match cgroup::apply(layout, spec, pid) {
            Ok(group) => Ok(Some(group)),
            Err(e) if self.config.allow_unconfined => {
                tracing::warn!(error = %e, pid, "running without pid limit");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Removes the group whatever the wait reported, then passes the result on.
fn finish(exit: Result<ChildExit>, group: Option<&PidsCgroup>) -> Result<ChildExit> {
    if let Some(group) = group {
        cleanup(group);
    }
    exit
}

fn cleanup(group: &PidsCgroup) {
    match group.destroy() {
        Ok(()) => {}
        // v1 release agents may race us for the directory.
        Err(e) if group.auto_release() => {
            tracing::debug!(error = %e, path = %group.path().display(), "left cgroup to release agent");
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %group.path().display(), "could not remove cgroup");
        }
    }
}
