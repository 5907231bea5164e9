mod executor;
mod default_executor;
mod builtins;
mod fd;
mod launcher;
mod pipeline;
mod redirect;
mod signal;

pub use executor::{Executor, ExecOutcome, ExecStatus};
pub use default_executor::DefaultExecutor;
pub use builtins::{BuiltinCommand, BuiltinManager};
pub use signal::SignalPolicy;
