use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use tracing::trace;
use crate::ast::{AstNode, RedirectMode};
use crate::error::ExecError;
use super::executor::{Executor, ExecOutcome, ExecStatus};
use super::fd::{self, STDERR, STDIN, STDOUT};
use super::launcher::{self, Role};
use super::signal::SignalPolicy;

pub struct RedirectHandler;

impl RedirectHandler {
    /// Fork a child, apply the redirection there, run `node` in it and
    /// wait. The shell's own descriptors are never touched.
    pub fn handle_redirect(
        node: &AstNode,
        target: Option<RawFd>,
        mode: &RedirectMode,
        merge_stderr: bool,
        signals: &SignalPolicy,
        executor: &mut dyn Executor,
    ) -> ExecStatus {
        let child = launcher::spawn(signals, Role::Redirect, || {
            if let Err(e) = Self::apply(target, mode, merge_stderr) {
                eprintln!("{}", e);
                return 1;
            }
            launcher::run_in_child(node, &mut *executor)
        })?;
        Ok(ExecOutcome::Code(child.wait()?))
    }

    /// Perform a single redirection on the current process.
    pub fn apply(target: Option<RawFd>, mode: &RedirectMode, merge_stderr: bool) -> Result<(), ExecError> {
        trace!(?target, ?mode, "applying redirect");
        match mode {
            RedirectMode::Input(path) => {
                let file = open(path, OpenOptions::new().read(true))?;
                fd::install(file.into(), target.unwrap_or(STDIN))
            }
            RedirectMode::Output(path) => {
                let file = open(path, OpenOptions::new().write(true).create(true).truncate(true))?;
                Self::install_output(file.into(), target, merge_stderr)
            }
            RedirectMode::Append(path) => {
                let file = open(path, OpenOptions::new().append(true).create(true))?;
                Self::install_output(file.into(), target, merge_stderr)
            }
            RedirectMode::DuplicateFd(source) => fd::duplicate(*source, target.unwrap_or(STDOUT)),
        }
    }

    fn install_output(file: OwnedFd, target: Option<RawFd>, merge_stderr: bool) -> Result<(), ExecError> {
        match target {
            Some(slot) => fd::install(file, slot),
            None => {
                if merge_stderr {
                    fd::duplicate(file.as_raw_fd(), STDERR)?;
                }
                fd::install(file, STDOUT)
            }
        }
    }
}

fn open(path: &str, options: &OpenOptions) -> Result<File, ExecError> {
    options.open(path).map_err(|source| ExecError::Open {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::config::SessionConfig;
    use crate::environment::Environment;
    use crate::executor::DefaultExecutor;
    use crate::executor::tests::{capture, executor, read, serial};

    fn path_of(p: &Path) -> String {
        p.to_str().unwrap().to_string()
    }

    #[test]
    fn test_output_then_input_round_trip() {
        let _guard = serial();
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        let mut exec = executor();

        let write = capture(AstNode::command("printf", &["line one\\nline two\\n"]), &first);
        assert_eq!(exec.run_command(&write), ExecOutcome::Code(0));

        let copy = capture(
            AstNode::redirect(
                AstNode::command("cat", &[]),
                None,
                RedirectMode::Input(path_of(&first)),
            ),
            &second,
        );
        assert_eq!(exec.run_command(&copy), ExecOutcome::Code(0));
        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
        assert_eq!(read(&second), "line one\nline two\n");
    }

    #[test]
    fn test_output_truncates_and_append_accumulates() {
        let _guard = serial();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("log.txt");
        std::fs::write(&out, "stale content that is long\n").unwrap();
        let mut exec = executor();

        exec.run_command(&capture(AstNode::command("printf", &["one\\n"]), &out));
        assert_eq!(read(&out), "one\n");

        for word in ["two\\n", "three\\n"] {
            let append = AstNode::redirect(
                AstNode::command("printf", &[word]),
                None,
                RedirectMode::Append(path_of(&out)),
            );
            exec.run_command(&append);
        }
        assert_eq!(read(&out), "one\ntwo\nthree\n");
    }

    #[test]
    fn test_missing_input_fails_child_only() {
        let _guard = serial();
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran.txt");
        let tree = AstNode::redirect(
            capture(AstNode::command("printf", &["ran"]), &marker),
            None,
            RedirectMode::Input(path_of(&dir.path().join("missing.txt"))),
        );
        assert_eq!(executor().run_command(&tree), ExecOutcome::Code(1));
        assert!(!marker.exists());
    }

    #[test]
    fn test_explicit_fd_and_duplicate() {
        let _guard = serial();
        let dir = tempfile::tempdir().unwrap();
        let err_file = dir.path().join("err.txt");
        let out_file = dir.path().join("out.txt");

        // sh -c 'echo oops >&2' 2>err.txt
        let tree = AstNode::redirect(
            AstNode::command("sh", &["-c", "echo oops >&2"]),
            Some(STDERR),
            RedirectMode::Output(path_of(&err_file)),
        );
        executor().run_command(&tree);
        assert_eq!(read(&err_file), "oops\n");

        // (sh -c 'echo oops >&2' 2>&1) >out.txt
        let tree = capture(
            AstNode::redirect(
                AstNode::command("sh", &["-c", "echo oops >&2"]),
                Some(STDERR),
                RedirectMode::DuplicateFd(STDOUT),
            ),
            &out_file,
        );
        executor().run_command(&tree);
        assert_eq!(read(&out_file), "oops\n");
    }

    #[test]
    fn test_default_output_leaves_stderr_unless_configured() {
        let _guard = serial();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let tree = capture(AstNode::command("sh", &["-c", "echo out; echo err >&2"]), &out);

        executor().run_command(&tree);
        assert_eq!(read(&out), "out\n");

        let mut config = SessionConfig::default();
        config.merge_stderr_on_default_output = true;
        DefaultExecutor::new(config, Environment::empty()).run_command(&tree);
        assert_eq!(read(&out), "out\nerr\n");
    }

    #[test]
    fn test_bad_duplicate_source() {
        let _guard = serial();
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran.txt");
        let tree = AstNode::redirect(
            capture(AstNode::command("printf", &["ran"]), &marker),
            Some(5),
            RedirectMode::DuplicateFd(987),
        );
        assert_eq!(executor().run_command(&tree), ExecOutcome::Code(1));
        assert!(!marker.exists());
    }
}
