use crate::ast::{AstNode, CommandNode};
use crate::config::SessionConfig;
use crate::environment::Environment;
use crate::error::ExecError;
use super::builtins::BuiltinManager;
use super::executor::{Executor, ExecOutcome, ExecStatus};
use super::launcher;
use super::pipeline::PipelineHandler;
use super::redirect::RedirectHandler;
use super::signal::SignalPolicy;

/// Executes trees with one OS process per external command.
pub struct DefaultExecutor {
    builtins: BuiltinManager,
    env: Environment,
    config: SessionConfig,
    signals: SignalPolicy,
}

impl DefaultExecutor {
    pub fn new(config: SessionConfig, env: Environment) -> Self {
        DefaultExecutor {
            builtins: BuiltinManager::new(),
            env,
            signals: SignalPolicy::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Execute one top-level tree. A missing tree is a no-op.
    pub fn run(&mut self, root: Option<&AstNode>) -> ExecOutcome {
        match root {
            Some(node) => self.run_command(node),
            None => ExecOutcome::Code(0),
        }
    }

    fn exec_command(&mut self, cmd: &CommandNode) -> ExecStatus {
        if self.builtins.is_builtin(&cmd.program) {
            return self.builtins.execute(cmd, &self.env);
        }
        launcher::launch(cmd, &self.signals)
    }

    /// `first; second`: the second part runs whatever the first returned,
    /// unless the first asked the shell to exit.
    fn exec_sequence(&mut self, first: &AstNode, second: &AstNode) -> ExecStatus {
        if let ExecOutcome::Exit(code) = self.run_command(first) {
            return Ok(ExecOutcome::Exit(code));
        }
        Ok(self.run_command(second))
    }
}

impl Executor for DefaultExecutor {
    fn exec(&mut self, node: &AstNode) -> ExecStatus {
        match node {
            AstNode::Command(cmd) => self.exec_command(cmd),
            AstNode::Sequence(first, second) => self.exec_sequence(first, second),
            AstNode::Pipe(stages) => {
                let signals = self.signals.clone();
                PipelineHandler::handle_pipeline(stages, &signals, self)
            }
            AstNode::Redirect { node: inner, fd, mode } => {
                let signals = self.signals.clone();
                let merge_stderr = self.config.merge_stderr_on_default_output;
                RedirectHandler::handle_redirect(inner, *fd, mode, merge_stderr, &signals, self)
            }
            AstNode::Subshell(_) => Err(ExecError::NotImplemented("subshell")),
            AstNode::Detach(_) => Err(ExecError::NotImplemented("detach")),
        }
    }

    fn is_builtin(&self, name: &str) -> bool {
        self.builtins.is_builtin(name)
    }
}
