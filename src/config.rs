use std::io::{BufRead, BufReader};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use nix::sys::signal::Signal;
use thiserror::Error;

/// Shell-session settings fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Ignored by the shell itself, restored to default in every child.
    pub ignored_signals: Vec<Signal>,
    /// When set, `>file` / `>>file` without an explicit fd also captures stderr.
    pub merge_stderr_on_default_output: bool,
    pub log_filter: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        ConfigLoader::default_config()
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> SessionConfig {
        SessionConfig {
            ignored_signals: vec![Signal::SIGINT, Signal::SIGQUIT, Signal::SIGTSTP],
            merge_stderr_on_default_output: false,
            log_filter: "warn".to_string(),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<SessionConfig, ConfigError> {
        let file = File::open(path)?;
        let mut src = String::new();
        for line in BufReader::new(file).lines() {
            src.push_str(&line?);
            src.push('\n');
        }
        Self::load_from_str(&src)
    }

    pub fn load_from_str(src: &str) -> Result<SessionConfig, ConfigError> {
        let mut config = Self::default_config();

        for (lineno, line) in src.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse(format!("line {}: no '=' found: {}", lineno + 1, line)));
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "ignore_signals" => {
                    config.ignored_signals = parse_signals(value)
                        .map_err(|bad| ConfigError::Parse(format!("line {}: unknown signal: {}", lineno + 1, bad)))?;
                }
                "merge_stderr_on_default_output" => {
                    config.merge_stderr_on_default_output = value.parse::<bool>()
                        .map_err(|_| ConfigError::Parse(format!("line {}: expected true or false: {}", lineno + 1, value)))?;
                }
                "log_filter" => config.log_filter = value.to_string(),
                _ => return Err(ConfigError::Parse(format!("line {}: unknown key: {}", lineno + 1, key))),
            }
        }

        Ok(config)
    }
}

fn parse_signals(value: &str) -> Result<Vec<Signal>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| Signal::from_str(name).map_err(|_| name.to_string()))
        .collect()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config: {0}")]
    Io(#[from] std::io::Error),
    #[error("config: {0}")]
    Parse(String),
}
