use tracing::trace;
use crate::ast::AstNode;
use crate::error::ExecError;
use super::executor::{Executor, ExecOutcome, ExecStatus};
use super::fd::PipeSet;
use super::launcher::{self, Role};
use super::signal::SignalPolicy;

pub struct PipelineHandler;

impl PipelineHandler {
    /// Run `stages` concurrently, stage `i` reading from stage `i - 1`.
    /// The status is the last stage's.
    pub fn handle_pipeline(
        stages: &[AstNode],
        signals: &SignalPolicy,
        executor: &mut dyn Executor,
    ) -> ExecStatus {
        if stages.len() < 2 {
            return Err(ExecError::PipelineError(format!(
                "expected at least two stages, got {}",
                stages.len()
            )));
        }

        // All pipes exist before the first fork, so every child can close
        // every end it does not use.
        let mut pipes = PipeSet::open(stages.len() - 1)?;
        trace!(pipes = pipes.len(), "created pipeline pipes");

        let mut children = Vec::with_capacity(stages.len());
        for (i, stage) in stages.iter().enumerate() {
            let spawned = launcher::spawn(signals, Role::Stage(i), || {
                if let Err(e) = pipes.attach_stage(i) {
                    eprintln!("{}", e);
                    return 1;
                }
                pipes.close_all();
                launcher::run_in_child(stage, &mut *executor)
            });

            match spawned {
                Ok(child) => children.push(child),
                Err(e) => {
                    // Earlier stages keep running; once the pipes are gone
                    // they see EOF or EPIPE and can be reaped.
                    pipes.close_all();
                    let _ = launcher::wait_all(children);
                    return Err(e);
                }
            }
        }

        pipes.close_all();
        Ok(ExecOutcome::Code(launcher::wait_all(children)?))
    }
}
