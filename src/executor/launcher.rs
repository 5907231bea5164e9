use std::ffi::CString;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{execvp, fork, ForkResult, Pid};
use tracing::debug;
use crate::ast::{AstNode, CommandNode};
use crate::error::ExecError;
use super::executor::{Executor, ExecOutcome, ExecStatus};
use super::signal::SignalPolicy;

/// What a forked child was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Command,
    Stage(usize),
    Redirect,
}

/// A forked child that has not been reaped yet.
#[derive(Debug)]
#[must_use = "children must be waited on or they linger as zombies"]
pub struct ChildProcess {
    pub pid: Pid,
    pub role: Role,
}

impl ChildProcess {
    /// Block until the child terminates. A child killed by a signal reports
    /// 128 plus the signal number.
    pub fn wait(self) -> Result<i32, ExecError> {
        loop {
            match waitpid(self.pid, None) {
                Ok(WaitStatus::Exited(_, code)) => {
                    debug!(pid = self.pid.as_raw(), role = ?self.role, code, "reaped child");
                    return Ok(code);
                }
                Ok(WaitStatus::Signaled(_, sig, _)) => {
                    debug!(pid = self.pid.as_raw(), role = ?self.role, signal = ?sig, "child killed");
                    return Ok(128 + sig as i32);
                }
                Ok(_) | Err(Errno::EINTR) => continue,
                Err(e) => return Err(ExecError::Wait(e)),
            }
        }
    }
}

/// Reap every child in order. Returns the status of the last one, or the
/// first wait failure once all of them have been attempted.
pub fn wait_all(children: Vec<ChildProcess>) -> Result<i32, ExecError> {
    let mut last = Ok(0);
    for child in children {
        match child.wait() {
            Ok(code) => {
                if last.is_ok() {
                    last = Ok(code);
                }
            }
            Err(e) => {
                debug!(error = %e, "wait failed");
                if last.is_ok() {
                    last = Err(e);
                }
            }
        }
    }
    last
}

/// Fork a child that restores default signal handling, runs `body` and
/// terminates with the code it returns. Only the parent returns.
pub fn spawn<F>(signals: &SignalPolicy, role: Role, body: F) -> Result<ChildProcess, ExecError>
where
    F: FnOnce() -> i32,
{
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!(pid = child.as_raw(), ?role, "forked child");
            Ok(ChildProcess { pid: child, role })
        }
        Ok(ForkResult::Child) => {
            signals.restore_defaults();
            terminate(body())
        }
        Err(e) => Err(ExecError::Fork(e)),
    }
}

/// End a forked child without running destructors or flushing buffers
/// copied from the parent.
pub fn terminate(code: i32) -> ! {
    unsafe { libc::_exit(code) }
}

/// Program path and argument vector converted for `execvp`.
#[derive(Debug)]
pub struct Program {
    name: String,
    file: CString,
    argv: Vec<CString>,
}

impl Program {
    pub fn prepare(cmd: &CommandNode) -> Result<Self, ExecError> {
        let file = to_cstring(&cmd.program)?;
        let mut argv = cmd
            .argv
            .iter()
            .map(|arg| to_cstring(arg))
            .collect::<Result<Vec<_>, _>>()?;
        if argv.is_empty() {
            argv.push(file.clone());
        }
        Ok(Program {
            name: cmd.program.clone(),
            file,
            argv,
        })
    }

    /// Replace the current process image. Returns only on failure.
    pub fn exec(&self) -> ExecError {
        match execvp(&self.file, &self.argv) {
            Ok(never) => match never {},
            Err(source) => ExecError::Exec {
                program: self.name.clone(),
                source,
            },
        }
    }
}

fn to_cstring(s: &str) -> Result<CString, ExecError> {
    CString::new(s).map_err(|_| ExecError::InvalidArgument(s.to_string()))
}

/// Exec `cmd` in the current (child) process, or report why not and exit 1.
pub fn exec_or_exit(cmd: &CommandNode) -> ! {
    let err = match Program::prepare(cmd) {
        Ok(program) => program.exec(),
        Err(e) => e,
    };
    eprintln!("{}", err);
    terminate(1)
}

/// Body of a pipeline stage or redirect child once its descriptors are
/// wired. A bare external command replaces the child directly; anything
/// else runs through the dispatcher.
pub fn run_in_child(node: &AstNode, executor: &mut dyn Executor) -> i32 {
    if let AstNode::Command(cmd) = node {
        if !executor.is_builtin(&cmd.program) {
            exec_or_exit(cmd);
        }
    }
    match executor.run_command(node) {
        ExecOutcome::Exit(code) => code,
        ExecOutcome::Code(_) => 0,
    }
}

/// Run one external command in a new process and wait for it.
pub fn launch(cmd: &CommandNode, signals: &SignalPolicy) -> ExecStatus {
    let program = Program::prepare(cmd)?;
    let child = spawn(signals, Role::Command, || {
        eprintln!("{}", program.exec());
        1
    })?;
    Ok(ExecOutcome::Code(child.wait()?))
}
