//! System-wide constants and default paths.

/// Application name used in log output and default cgroup names.
pub const APP_NAME: &str = "corral";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "corral";

/// Mount point of the cgroup hierarchy (v2 unified, or the v1 tmpfs).
pub const CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Default `pids.max` applied to every launch.
pub const DEFAULT_PIDS_MAX: u64 = 20;

/// Default hostname inside the UTS namespace.
pub const DEFAULT_HOSTNAME: &str = "container";

/// Default root filesystem; `/` keeps the host tree visible.
pub const DEFAULT_ROOTFS: &str = "/";

/// Size of the stack handed to the cloned child.
pub const DEFAULT_STACK_SIZE: usize = 1024 * 1024;

/// Path the setup stage re-executes to enter its second stage.
pub const SELF_EXE: &str = "/proc/self/exe";

/// Mount point for the new `proc` filesystem, relative to the new root.
pub const PROC_MOUNT: &str = "/proc";

/// Exit status reported by the launcher when setup fails inside the child.
pub const SETUP_FAILURE_EXIT: i32 = 1;
