use std::collections::HashMap;
use tracing::debug;
use crate::ast::CommandNode;
use crate::environment::Environment;
use crate::error::ExecError;
use super::executor::{ExecOutcome, ExecStatus};

/// A command run inside the shell process itself, without forking.
pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    fn run(&self, cmd: &CommandNode, env: &Environment) -> ExecStatus;
}

pub struct BuiltinManager {
    commands: HashMap<String, Box<dyn BuiltinCommand>>,
}

impl BuiltinManager {
    pub fn new() -> Self {
        let mut mgr = BuiltinManager {
            commands: HashMap::new(),
        };
        mgr.register(Box::new(CdCommand));
        mgr.register(Box::new(ExitCommand));
        mgr
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn execute(&self, cmd: &CommandNode, env: &Environment) -> ExecStatus {
        match self.commands.get(&cmd.program) {
            Some(builtin) => builtin.run(cmd, env),
            None => Err(ExecError::NoSuchBuiltin(cmd.program.clone())),
        }
    }
}

impl Default for BuiltinManager {
    fn default() -> Self {
        Self::new()
    }
}

/// `cd [path]`, falling back to `$HOME`.
pub struct CdCommand;

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn run(&self, cmd: &CommandNode, env: &Environment) -> ExecStatus {
        let target = match cmd.arg(1) {
            Some(path) => path,
            None => env.get("HOME").ok_or(ExecError::MissingEnv("HOME"))?,
        };
        std::env::set_current_dir(target).map_err(|source| ExecError::DirectoryError {
            path: target.to_string(),
            source,
        })?;
        debug!(dir = target, "changed directory");
        Ok(ExecOutcome::Code(0))
    }
}

/// `exit [code]`. The code is read like C `atoi`, so garbage means 0.
pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn run(&self, cmd: &CommandNode, _env: &Environment) -> ExecStatus {
        Ok(ExecOutcome::Exit(cmd.arg(1).map(atoi).unwrap_or(0)))
    }
}

fn atoi(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i32, |acc, b| acc.wrapping_mul(10).wrapping_add(i32::from(b - b'0')));
    if negative { value.wrapping_neg() } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::tests::serial;

    fn cd(args: &[&str], env: &Environment) -> ExecStatus {
        BuiltinManager::new().execute(&CommandNode::new("cd", args), env)
    }

    fn exit(args: &[&str]) -> ExecOutcome {
        BuiltinManager::new()
            .execute(&CommandNode::new("exit", args), &Environment::empty())
            .unwrap()
    }

    struct CwdGuard(std::path::PathBuf);

    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    #[test]
    fn test_registry() {
        let mgr = BuiltinManager::new();
        assert!(mgr.is_builtin("cd"));
        assert!(mgr.is_builtin("exit"));
        assert!(!mgr.is_builtin("ls"));
        let err = mgr
            .execute(&CommandNode::new("ls", &[]), &Environment::empty())
            .unwrap_err();
        assert!(matches!(err, ExecError::NoSuchBuiltin(name) if name == "ls"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit(&["7"]), ExecOutcome::Exit(7));
        assert_eq!(exit(&[]), ExecOutcome::Exit(0));
        assert_eq!(exit(&["abc"]), ExecOutcome::Exit(0));
        assert_eq!(exit(&["12abc"]), ExecOutcome::Exit(12));
        assert_eq!(exit(&[" -3"]), ExecOutcome::Exit(-3));
    }

    #[test]
    fn test_cd_to_argument() {
        let _guard = serial();
        let _cwd = CwdGuard(std::env::current_dir().unwrap());
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().canonicalize().unwrap();

        let status = cd(&[target.to_str().unwrap()], &Environment::empty()).unwrap();
        assert_eq!(status, ExecOutcome::Code(0));
        assert_eq!(std::env::current_dir().unwrap(), target);
    }

    #[test]
    fn test_cd_defaults_to_home() {
        let _guard = serial();
        let _cwd = CwdGuard(std::env::current_dir().unwrap());
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().canonicalize().unwrap();
        let mut env = Environment::empty();
        env.set("HOME", home.to_str().unwrap());

        cd(&[], &env).unwrap();
        assert_eq!(std::env::current_dir().unwrap(), home);
    }

    #[test]
    fn test_cd_without_home_leaves_cwd() {
        let _guard = serial();
        let before = std::env::current_dir().unwrap();
        let err = cd(&[], &Environment::empty()).unwrap_err();
        assert!(matches!(err, ExecError::MissingEnv("HOME")));
        assert_eq!(err.to_string(), "cd: HOME not set");
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_cd_bad_path() {
        let _guard = serial();
        let before = std::env::current_dir().unwrap();
        let err = cd(&["/vush/no/such/dir"], &Environment::empty()).unwrap_err();
        assert!(matches!(err, ExecError::DirectoryError { .. }));
        assert!(err.to_string().starts_with("cd: /vush/no/such/dir: "));
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
