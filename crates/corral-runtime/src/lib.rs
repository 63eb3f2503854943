//! Launch orchestration for corral.
//!
//! [`launcher::Launcher`] drives the parent side of `run`; [`setup`] holds
//! the code that runs inside the new namespaces, before and after the self
//! re-exec.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

#[cfg(target_os = "linux")]
pub mod launcher;
#[cfg(target_os = "linux")]
pub mod setup;
