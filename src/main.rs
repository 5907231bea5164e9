use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use vush::ast::AstNode;
use vush::config::{ConfigLoader, SessionConfig};
use vush::environment::Environment;
use vush::executor::{DefaultExecutor, ExecOutcome, SignalPolicy};

const USAGE: &str = "usage: vush [--config PATH] [-c TREE]";

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_path = std::env::var_os("VUSH_CONFIG").map(PathBuf::from);
    let mut tree_arg: Option<String> = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => match args.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => usage_error("--config requires a path"),
            },
            "-c" => match args.next() {
                Some(src) => tree_arg = Some(src),
                None => usage_error("-c requires a tree"),
            },
            other => usage_error(&format!("unexpected argument: {}", other)),
        }
    }

    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(&path).unwrap_or_else(|e| {
            eprintln!("vush: {}: {}", path.display(), e);
            std::process::exit(2);
        }),
        None => SessionConfig::default(),
    };

    let mut executor = DefaultExecutor::new(config, Environment::new());
    init_tracing(executor.config());

    let policy = SignalPolicy::from_config(executor.config());
    debug!(signals = ?policy.signals(), "ignoring signals in the shell");
    if let Err(e) = policy.ignore_in_shell() {
        warn!("could not ignore signals: {}", e);
    }

    let code = match tree_arg {
        Some(src) => match parse_tree(&src) {
            Ok(tree) => executor.run(tree.as_ref()).code(),
            Err(e) => {
                eprintln!("vush: {}", e);
                2
            }
        },
        None => run_stdin(&mut executor),
    };
    std::process::exit(code);
}

/// Execute one tree per input line until EOF or `exit`.
fn run_stdin(executor: &mut DefaultExecutor) -> i32 {
    let mut status = 0;
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("vush: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_tree(&line) {
            Ok(tree) => match executor.run(tree.as_ref()) {
                ExecOutcome::Exit(code) => return code,
                ExecOutcome::Code(code) => status = code,
            },
            Err(e) => eprintln!("vush: {}", e),
        }
    }
    debug!(status, "end of input");
    status
}

fn parse_tree(src: &str) -> serde_json::Result<Option<AstNode>> {
    serde_json::from_str(src)
}

fn init_tracing(config: &SessionConfig) {
    let filter = EnvFilter::try_from_env("VUSH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn usage_error(msg: &str) -> ! {
    eprintln!("vush: {}\n{}", msg, USAGE);
    std::process::exit(2);
}
