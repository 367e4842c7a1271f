use crate::command::{Command, OsQuery};
use argh::{EarlyExit, FromArgs};
use regex::Regex;
use std::sync::LazyLock;

/// Builds a command from the trimmed remainder of the line.
type Builder = fn(&str) -> Result<Command, String>;

/// Every command the file manager understands, looked up by exact name.
///
/// Argument splitting is command-specific: single-path commands take the
/// whole remainder (spaces included), two-argument commands split it on the
/// first whitespace run, `os` parses its remainder as `--flag` switches.
static REGISTRY: &[(&str, Builder)] = &[
    (".exit", |rest: &str| no_args(rest, Command::Exit)),
    ("pwd", |rest: &str| no_args(rest, Command::Pwd)),
    ("up", |rest: &str| no_args(rest, Command::Up)),
    ("cd", |rest: &str| one_path(rest).map(Command::Cd)),
    ("ls", |rest: &str| Ok(Command::Ls(optional_path(rest)))),
    ("cat", |rest: &str| one_path(rest).map(Command::Cat)),
    ("add", |rest: &str| one_path(rest).map(Command::Add)),
    ("rm", |rest: &str| one_path(rest).map(Command::Rm)),
    ("hash", |rest: &str| one_path(rest).map(Command::Hash)),
    ("rn", |rest: &str| {
        two_args(rest).map(|(path, new_name)| Command::Rn { path, new_name })
    }),
    ("cp", |rest: &str| {
        two_args(rest).map(|(source, destination)| Command::Cp { source, destination })
    }),
    ("mv", |rest: &str| {
        two_args(rest).map(|(source, destination)| Command::Mv { source, destination })
    }),
    ("compress", |rest: &str| {
        two_args(rest).map(|(source, destination)| Command::Compress { source, destination })
    }),
    ("decompress", |rest: &str| {
        two_args(rest).map(|(source, destination)| Command::Decompress { source, destination })
    }),
    ("os", |rest: &str| os_query(rest).map(Command::Os)),
];

static ARG_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("argument separator pattern is valid"));

/// Names of all registered commands, in registry order.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}

/// Turn a raw input line into a [`Command`].
///
/// Never fails: unknown names become [`Command::Unknown`] and argument
/// problems become [`Command::Malformed`], to be reported by the dispatcher.
pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    match REGISTRY.iter().find(|(known, _)| *known == name) {
        Some((_, build)) => build(rest).unwrap_or_else(|reason| Command::Malformed {
            name: name.to_string(),
            reason,
        }),
        None => Command::Unknown(name.to_string()),
    }
}

fn no_args(rest: &str, command: Command) -> Result<Command, String> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(format!("unexpected argument `{rest}`"))
    }
}

fn one_path(rest: &str) -> Result<String, String> {
    optional_path(rest).ok_or_else(|| "missing path argument".to_string())
}

fn optional_path(rest: &str) -> Option<String> {
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Split on the first whitespace run. The second token keeps any spaces.
fn two_args(rest: &str) -> Result<(String, String), String> {
    let mut parts = ARG_SEPARATOR.splitn(rest, 2);
    match (parts.next(), parts.next()) {
        (Some(first), Some(second)) if !first.is_empty() && !second.is_empty() => {
            Ok((first.to_string(), second.to_string()))
        }
        _ => Err("expected two arguments".to_string()),
    }
}

#[derive(FromArgs)]
/// print information about the operating system.
struct OsArgs {
    #[argh(switch)]
    /// default end-of-line marker.
    eol: bool,

    #[argh(switch)]
    /// logical CPUs with model and clock rate.
    cpus: bool,

    #[argh(switch)]
    /// home directory of the current user.
    homedir: bool,

    #[argh(switch)]
    /// name of the current system user.
    username: bool,

    #[argh(switch)]
    /// CPU architecture the binary was built for.
    architecture: bool,
}

fn os_query(rest: &str) -> Result<OsQuery, String> {
    let args: Vec<&str> = rest.split_whitespace().collect();
    let parsed = OsArgs::from_args(&["os"], &args)
        .map_err(|EarlyExit { output, .. }| output.trim().to_string())?;

    let selected: Vec<OsQuery> = [
        (parsed.eol, OsQuery::Eol),
        (parsed.cpus, OsQuery::Cpus),
        (parsed.homedir, OsQuery::HomeDir),
        (parsed.username, OsQuery::Username),
        (parsed.architecture, OsQuery::Architecture),
    ]
    .into_iter()
    .filter_map(|(on, query)| on.then_some(query))
    .collect();

    match selected.as_slice() {
        [query] => Ok(*query),
        [] => Err("expected one of --eol, --cpus, --homedir, --username, --architecture".to_string()),
        _ => Err("expected exactly one flag".to_string()),
    }
}
