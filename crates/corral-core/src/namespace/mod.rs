//! Linux namespace management for launch isolation.
//!
//! Provides the `clone(2)` launcher and the in-namespace setup calls for
//! the mount and UTS namespaces.

pub mod launcher;
pub mod mount;
pub mod uts;

use nix::sched::CloneFlags;

pub use launcher::{ChildExit, ChildHandle, launch};

/// Which namespaces a launch creates.
///
/// Fixed once the clone is issued; descendants inherit the namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceFlagSet {
    /// New mount namespace (`CLONE_NEWNS`).
    pub mount: bool,
    /// New hostname namespace (`CLONE_NEWUTS`).
    pub uts: bool,
    /// New PID namespace (`CLONE_NEWPID`).
    pub pid: bool,
}

impl NamespaceFlagSet {
    /// Mount, UTS, and PID namespaces: the set used by `run`.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            mount: true,
            uts: true,
            pid: true,
        }
    }

    /// No new namespaces; the child shares everything with its parent.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            mount: false,
            uts: false,
            pid: false,
        }
    }

    /// Converts the set into `clone(2)` flags.
    #[must_use]
    pub fn to_clone_flags(self) -> CloneFlags {
        let mut flags = CloneFlags::empty();
        if self.mount {
            flags |= CloneFlags::CLONE_NEWNS;
        }
        if self.uts {
            flags |= CloneFlags::CLONE_NEWUTS;
        }
        if self.pid {
            flags |= CloneFlags::CLONE_NEWPID;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_maps_to_three_namespace_flags() {
        assert_eq!(
            NamespaceFlagSet::all().to_clone_flags(),
            CloneFlags::CLONE_NEWNS | CloneFlags::CLONE_NEWUTS | CloneFlags::CLONE_NEWPID
        );
    }

    #[test]
    fn none_maps_to_empty_flags() {
        assert!(NamespaceFlagSet::none().to_clone_flags().is_empty());
    }

    #[test]
    fn single_namespace_maps_to_single_flag() {
        let flags = NamespaceFlagSet {
            uts: true,
            ..NamespaceFlagSet::none()
        };
        assert_eq!(flags.to_clone_flags(), CloneFlags::CLONE_NEWUTS);
    }
}
