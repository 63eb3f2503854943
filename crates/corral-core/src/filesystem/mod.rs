//! Filesystem steps of namespace setup.
//!
//! Provides the root change and the `/proc` mount that must happen inside
//! the new mount and PID namespaces.

pub mod mount;
pub mod root;
