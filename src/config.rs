use argh::{EarlyExit, FromArgs};
use std::path::PathBuf;

/// Environment variable consulted when `--username` is not given.
pub const USERNAME_VAR: &str = "FILE_MANAGER_USERNAME";

#[derive(FromArgs, Debug, Default, PartialEq)]
/// Interactive file manager.
pub struct Args {
    #[argh(option)]
    /// name used in the greeting and farewell; falls back to $FILE_MANAGER_USERNAME.
    pub username: Option<String>,

    #[argh(option)]
    /// directory to start in. Defaults to the home directory.
    pub home: Option<PathBuf>,

    #[argh(option)]
    /// directory navigation may not leave. Defaults to the root of the start directory's volume.
    pub root: Option<PathBuf>,

    #[argh(switch, short = 'v')]
    /// log debug information to stderr.
    pub verbose: bool,
}

/// Parse process arguments, accepting `--flag=value` as well as `--flag value`.
///
/// `raw` includes the program name, as returned by `std::env::args`.
pub fn parse_args(raw: &[String]) -> Result<Args, EarlyExit> {
    let (program, rest) = match raw.split_first() {
        Some((program, rest)) => (program.as_str(), rest),
        None => ("file_manager", &[][..]),
    };
    let expanded: Vec<String> = rest.iter().flat_map(|arg| split_inline_value(arg)).collect();
    let expanded: Vec<&str> = expanded.iter().map(String::as_str).collect();
    Args::from_args(&[program], &expanded)
}

fn split_inline_value(arg: &str) -> Vec<String> {
    match arg.strip_prefix("--").and_then(|flag| flag.split_once('=')) {
        Some((flag, value)) => vec![format!("--{flag}"), value.to_string()],
        None => vec![arg.to_string()],
    }
}

/// Startup settings resolved from flags and the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub username: Option<String>,
    pub home: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub verbose: bool,
}

impl Config {
    /// Merge parsed flags with environment lookups done through `var`.
    pub fn from_args(args: Args, var: impl Fn(&str) -> Option<String>) -> Self {
        let username = args
            .username
            .or_else(|| var(USERNAME_VAR))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        Self {
            username,
            home: args.home,
            root: args.root,
            verbose: args.verbose,
        }
    }

    /// Default log directive when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}
