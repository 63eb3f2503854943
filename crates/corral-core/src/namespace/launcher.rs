//! Child creation in new namespaces via `clone(2)`.
//!
//! The child does not run its entry function until the parent opens a
//! readiness gate (one byte over an `O_CLOEXEC` pipe). Parent-side setup
//! that must precede any child work, such as cgroup enrollment, happens
//! between [`launch`] and [`ChildHandle::release`].

#![allow(unsafe_code)]

use std::os::fd::{AsRawFd, OwnedFd};

use corral_common::constants::SETUP_FAILURE_EXIT;
use corral_common::error::Result;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sched::clone;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{Pid, pipe2, read, write};

use super::NamespaceFlagSet;
use crate::platform::{SyscallExt, last_error, syscall_error};

/// How a launched child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// Normal exit with the given status.
    Exited(i32),
    /// Killed by a signal.
    Signaled(Signal),
}

impl ChildExit {
    /// Returns the status a shell would report: the exit code, or `128 + signo`.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(signal) => 128 + signal as i32,
        }
    }
}

/// Parent-side handle to a cloned child.
///
/// Owns the child's PID and the write end of its readiness gate.
#[derive(Debug)]
pub struct ChildHandle {
    pid: Pid,
    gate: Option<OwnedFd>,
}

impl ChildHandle {
    /// Returns the child's PID as seen from the parent's PID namespace.
    #[must_use]
    pub const fn pid(&self) -> Pid {
        self.pid
    }

    /// Lets the child proceed into its entry function.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate write fails, typically `EPIPE` when the
    /// child has already died.
    pub fn release(&mut self) -> Result<()> {
        if let Some(gate) = self.gate.take() {
            let _ = write(&gate, &[1]).or_platform("write")?;
            tracing::debug!(pid = %self.pid, "child released");
        }
        Ok(())
    }

    /// Closes the gate without releasing; the child exits without running
    /// its entry function.
    pub fn abandon(&mut self) {
        if self.gate.take().is_some() {
            tracing::debug!(pid = %self.pid, "child abandoned before release");
        }
    }

    /// Blocks until the child terminates.
    ///
    /// An unreleased child is abandoned first so the wait cannot deadlock.
    ///
    /// # Errors
    ///
    /// Returns an error if `waitpid(2)` fails for a reason other than `EINTR`.
    pub fn wait(mut self) -> Result<ChildExit> {
        self.abandon();
        loop {
            match waitpid(self.pid, None) {
                Ok(WaitStatus::Exited(_, code)) => return Ok(ChildExit::Exited(code)),
                Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(ChildExit::Signaled(signal)),
                Ok(status) => tracing::trace!(?status, "ignoring non-terminal wait status"),
                Err(Errno::EINTR) => {}
                Err(errno) => return Err(syscall_error("waitpid", errno)),
            }
        }
    }
}

/// Clones a child into the namespaces in `flags` and returns its handle.
///
/// The child runs on a dedicated heap stack of `stack_size` bytes; `nix`
/// passes its high end to the kernel since the stack grows downward. The
/// buffer stays alive until `clone` has returned in the parent. Without
/// `CLONE_VM` the child works on its own copy of memory, so `entry` may
/// freely use values it captured.
///
/// The caller should be single-threaded: only the calling thread exists in
/// the child, and locks held by other threads stay held there.
///
/// # Errors
///
/// Returns an error if the gate pipe cannot be created or `clone(2)` fails,
/// in which case no child exists.
pub fn launch<F>(flags: NamespaceFlagSet, stack_size: usize, mut entry: F) -> Result<ChildHandle>
where
    F: FnMut() -> isize,
{
    let (gate_read, gate_write) = pipe2(OFlag::O_CLOEXEC).or_platform("pipe2")?;
    let gate_write_raw = gate_write.as_raw_fd();

    let callback = Box::new(move || -> isize {
        // SAFETY: the child has its own copy of the fd table; closing the
        // inherited write end leaves the parent's descriptor untouched and
        // lets the read below observe EOF if the parent goes away.
        if unsafe { libc::close(gate_write_raw) } < 0 {
            tracing::warn!(error = %last_error(), "could not close gate write end in child");
        }
        match wait_for_release(&gate_read) {
            Ok(true) => entry(),
            Ok(false) => {
                tracing::debug!("launch abandoned by parent");
                SETUP_FAILURE_EXIT as isize
            }
            Err(e) => {
                tracing::error!(error = %e, "readiness gate failed");
                SETUP_FAILURE_EXIT as isize
            }
        }
    });

    let mut stack = vec![0_u8; stack_size];
    let clone_flags = flags.to_clone_flags();
    tracing::debug!(?clone_flags, stack_size, "cloning child");

    // SAFETY: the child does not share memory with the parent (no CLONE_VM),
    // the stack buffer outlives the call, and the callback only touches data
    // it owns.
    let pid = unsafe { clone(callback, &mut stack, clone_flags, Some(libc::SIGCHLD)) }
        .or_platform("clone")?;

    tracing::info!(pid = %pid, "child created");
    Ok(ChildHandle {
        pid,
        gate: Some(gate_write),
    })
}

/// Blocks on the gate; `true` once the parent released, `false` on EOF.
fn wait_for_release(gate: &OwnedFd) -> Result<bool> {
    let mut buf = [0_u8; 1];
    loop {
        match read(gate, &mut buf) {
            Ok(n) => return Ok(n == 1),
            Err(Errno::EINTR) => {}
            Err(errno) => return Err(syscall_error("read", errno)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_common::constants::DEFAULT_STACK_SIZE;

    #[test]
    fn released_child_runs_entry_and_reports_status() {
        let mut child = launch(NamespaceFlagSet::none(), DEFAULT_STACK_SIZE, || 3).expect("launch");
        assert!(child.pid().as_raw() > 0);
        child.release().expect("release");
        assert_eq!(child.wait().expect("wait"), ChildExit::Exited(3));
    }

    #[test]
    fn abandoned_child_skips_entry() {
        let child = launch(NamespaceFlagSet::none(), DEFAULT_STACK_SIZE, || 3).expect("launch");
        assert_eq!(
            child.wait().expect("wait"),
            ChildExit::Exited(SETUP_FAILURE_EXIT)
        );
    }

    #[test]
    fn entry_sees_captured_values() {
        let target = String::from("/bin/echo");
        let mut child = launch(NamespaceFlagSet::none(), DEFAULT_STACK_SIZE, move || {
            if target == "/bin/echo" { 0 } else { 9 }
        })
        .expect("launch");
        child.release().expect("release");
        assert_eq!(child.wait().expect("wait"), ChildExit::Exited(0));
    }

    #[test]
    fn exit_code_maps_signals_like_a_shell() {
        assert_eq!(ChildExit::Exited(0).exit_code(), 0);
        assert_eq!(ChildExit::Signaled(Signal::SIGKILL).exit_code(), 137);
    }
}
