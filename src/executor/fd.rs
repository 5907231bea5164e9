//! Descriptor plumbing for forked children.
//!
//! Every descriptor the engine creates is held as an [`OwnedFd`], so it is
//! closed when dropped on any path out of a function, including `?` returns.
//! Children end with `_exit` and never run destructors, so they release what
//! they inherited explicitly through [`PipeSet::close_all`] or by handing the
//! fd to [`install`].

use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
use nix::unistd::{dup2, pipe};
use crate::error::ExecError;

pub const STDIN: RawFd = libc::STDIN_FILENO;
pub const STDOUT: RawFd = libc::STDOUT_FILENO;
pub const STDERR: RawFd = libc::STDERR_FILENO;

/// Make `target` refer to the same open file as `from`. `from` stays open.
pub fn duplicate(from: RawFd, target: RawFd) -> Result<(), ExecError> {
    dup2(from, target).map_err(|source| ExecError::Dup { from, to: target, source })?;
    Ok(())
}

/// Move `fd` into slot `target`, closing the original descriptor.
pub fn install(fd: OwnedFd, target: RawFd) -> Result<(), ExecError> {
    if fd.as_raw_fd() == target {
        // Already in place; closing it would undo the redirection.
        let _ = fd.into_raw_fd();
        return Ok(());
    }
    duplicate(fd.as_raw_fd(), target)
}

/// The N-1 pipes joining the N stages of a pipeline.
#[derive(Debug)]
pub struct PipeSet {
    pipes: Vec<(OwnedFd, OwnedFd)>,
}

impl PipeSet {
    /// Create `count` pipes up front. If any creation fails, the ones
    /// already created are closed before the error is returned.
    pub fn open(count: usize) -> Result<Self, ExecError> {
        let mut pipes = Vec::with_capacity(count);
        for _ in 0..count {
            pipes.push(pipe().map_err(ExecError::Pipe)?);
        }
        Ok(PipeSet { pipes })
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    /// Wire the standard streams of `stage`: it reads from the pipe before
    /// it and writes to its own pipe. First and last stages keep the
    /// inherited stdin and stdout respectively.
    pub fn attach_stage(&self, stage: usize) -> Result<(), ExecError> {
        if stage > 0 {
            duplicate(self.pipes[stage - 1].0.as_raw_fd(), STDIN)?;
        }
        if stage < self.pipes.len() {
            duplicate(self.pipes[stage].1.as_raw_fd(), STDOUT)?;
        }
        Ok(())
    }

    /// Close both ends of every pipe.
    pub fn close_all(&mut self) {
        self.pipes.clear();
    }
}
