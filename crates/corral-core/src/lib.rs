//! # corral-core
//!
//! Low-level Linux isolation primitives for the corral launcher.
//!
//! This crate provides safe abstractions over:
//! - **Namespaces**: `clone(2)` into new mount, UTS, and PID namespaces.
//! - **Process images**: `execve(2)` with explicit argv/envp construction.
//! - **Filesystem**: `chroot(2)` and the `/proc` mount for the new PID namespace.
//! - **Cgroups**: the `pids` controller on both v1 and v2 hierarchies.
//!
//! All unsafe system calls are encapsulated in safe wrappers with
//! proper error handling and `// SAFETY:` documentation.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cgroup;
pub mod cstring;
pub mod platform;

#[cfg(target_os = "linux")]
pub mod filesystem;
#[cfg(target_os = "linux")]
pub mod namespace;
#[cfg(target_os = "linux")]
pub mod process;
