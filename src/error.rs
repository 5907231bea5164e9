use std::io;
use std::os::unix::io::RawFd;
use thiserror::Error;

/// Failures raised while executing a tree. `Display` renders the
/// `label: system-error-text` diagnostic printed on stderr.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("fork: {0}")]
    Fork(#[source] nix::Error),

    #[error("pipe: {0}")]
    Pipe(#[source] nix::Error),

    #[error("waitpid: {0}")]
    Wait(#[source] nix::Error),

    #[error("{program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: nix::Error,
    },

    #[error("{path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("dup2 {from} -> {to}: {source}")]
    Dup {
        from: RawFd,
        to: RawFd,
        #[source]
        source: nix::Error,
    },

    #[error("cd: {0} not set")]
    MissingEnv(&'static str),

    #[error("cd: {path}: {source}")]
    DirectoryError {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}: invalid argument")]
    InvalidArgument(String),

    #[error("pipeline: {0}")]
    PipelineError(String),

    #[error("{0}: not yet implemented")]
    NotImplemented(&'static str),

    #[error("no such builtin command: {0}")]
    NoSuchBuiltin(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn test_diagnostics_use_label_prefix() {
        assert_eq!(ExecError::MissingEnv("HOME").to_string(), "cd: HOME not set");
        assert!(ExecError::Fork(Errno::EAGAIN).to_string().starts_with("fork: "));
        assert_eq!(
            ExecError::NotImplemented("subshell").to_string(),
            "subshell: not yet implemented"
        );
        let err = ExecError::Exec {
            program: "nope".to_string(),
            source: Errno::ENOENT,
        };
        assert!(err.to_string().starts_with("nope: "));
    }
}
