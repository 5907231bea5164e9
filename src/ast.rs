use std::os::unix::io::RawFd;
use serde::{Deserialize, Serialize};

/// A parsed shell construct. Trees are built by the parser and only read by
/// the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AstNode {
    Command(CommandNode),
    Sequence(Box<AstNode>, Box<AstNode>),
    Pipe(Vec<AstNode>),
    Redirect {
        node: Box<AstNode>,
        /// Target descriptor slot; `None` means the mode's default stream.
        #[serde(default)]
        fd: Option<RawFd>,
        mode: RedirectMode,
    },
    Subshell(Box<AstNode>),
    Detach(Box<AstNode>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandNode {
    pub program: String,
    /// Full argument vector, `argv[0]` is the program name.
    pub argv: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectMode {
    Input(String),
    Output(String),
    Append(String),
    DuplicateFd(RawFd),
}

impl CommandNode {
    pub fn new(program: &str, args: &[&str]) -> Self {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(program.to_string());
        argv.extend(args.iter().map(|s| s.to_string()));
        CommandNode {
            program: program.to_string(),
            argv,
        }
    }

    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    /// Positional argument `n` (`arg(1)` is the first one after the program).
    pub fn arg(&self, n: usize) -> Option<&str> {
        self.argv.get(n).map(|s| s.as_str())
    }
}

impl AstNode {
    pub fn command(program: &str, args: &[&str]) -> Self {
        AstNode::Command(CommandNode::new(program, args))
    }

    pub fn sequence(first: AstNode, second: AstNode) -> Self {
        AstNode::Sequence(Box::new(first), Box::new(second))
    }

    pub fn pipe(stages: Vec<AstNode>) -> Self {
        AstNode::Pipe(stages)
    }

    pub fn redirect(node: AstNode, fd: Option<RawFd>, mode: RedirectMode) -> Self {
        AstNode::Redirect {
            node: Box::new(node),
            fd,
            mode,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            AstNode::Command(_) => "command",
            AstNode::Sequence(..) => "sequence",
            AstNode::Pipe(_) => "pipe",
            AstNode::Redirect { .. } => "redirect",
            AstNode::Subshell(_) => "subshell",
            AstNode::Detach(_) => "detach",
        }
    }
}
