//! Process utilities for build subprocesses
//!
//! Builds are spawned as the leader of their own process group so that
//! killing one also takes down the tools it started (xcodebuild, gradle
//! daemons spawned by wrapper scripts, `sh -c` children).

use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;

/// Check if a process with the given PID is alive
///
/// Sends the null signal: `EPERM` still means the process exists, `ESRCH`
/// means it does not.
pub fn is_process_alive(pid: u32) -> bool {
    let Some(pid) = to_pid(pid) else {
        return false;
    };

    match kill(pid, None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// SIGKILL the process group led by `pid`, falling back to the single
/// process when no such group exists.
///
/// Returns false if nothing could be signalled.
pub fn kill_process_tree(pid: u32) -> bool {
    let Some(pid) = to_pid(pid) else {
        return false;
    };

    match killpg(pid, Signal::SIGKILL) {
        Ok(()) => true,
        Err(Errno::ESRCH) => kill(pid, Signal::SIGKILL).is_ok(),
        Err(e) => {
            tracing::warn!("Failed to kill process group {pid}: {e}");
            kill(pid, Signal::SIGKILL).is_ok()
        }
    }
}

/// PIDs above `i32::MAX` (and 0, which would address our own group) are
/// never valid targets
fn to_pid(pid: u32) -> Option<Pid> {
    i32::try_from(pid)
        .ok()
        .filter(|p| *p > 0)
        .map(Pid::from_raw)
}
