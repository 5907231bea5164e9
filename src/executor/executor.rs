use crate::ast::AstNode;
use crate::error::ExecError;

/// How a unit of work finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Completed with this status.
    Code(i32),
    /// The `exit` built-in asked the current process to terminate.
    Exit(i32),
}

impl ExecOutcome {
    pub fn code(self) -> i32 {
        match self {
            ExecOutcome::Code(code) | ExecOutcome::Exit(code) => code,
        }
    }
}

pub type ExecStatus = Result<ExecOutcome, ExecError>;

pub trait Executor {
    fn exec(&mut self, node: &AstNode) -> ExecStatus;

    fn is_builtin(&self, _name: &str) -> bool {
        false
    }

    /// Execute `node`, reporting any failure on stderr. A failed unit
    /// degrades to status 1 and never takes the caller down with it.
    fn run_command(&mut self, node: &AstNode) -> ExecOutcome {
        match self.exec(node) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(kind = node.kind_name(), "execution failed: {}", e);
                eprintln!("{}", e);
                ExecOutcome::Code(1)
            }
        }
    }
}
