/// A parsed input line.
///
/// Produced by [`crate::parser::parse_line`] and consumed right away by the
/// dispatcher. Path arguments are kept as typed by the user; resolution
/// against the session happens in the handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank input line.
    Empty,
    /// `.exit`: say goodbye and stop.
    Exit,
    Pwd,
    /// Same as `cd ..`, refused at the root.
    Up,
    Cd(String),
    /// Lists the given directory, or the current one.
    Ls(Option<String>),
    Cat(String),
    Add(String),
    Rn { path: String, new_name: String },
    Cp { source: String, destination: String },
    Mv { source: String, destination: String },
    Rm(String),
    Hash(String),
    Compress { source: String, destination: String },
    Decompress { source: String, destination: String },
    Os(OsQuery),
    /// A known command with missing, extra or invalid arguments.
    Malformed { name: String, reason: String },
    /// A name that is not in the command registry.
    Unknown(String),
}

impl Command {
    /// Name of the command as typed by the user.
    pub fn name(&self) -> &str {
        match self {
            Command::Empty => "",
            Command::Exit => ".exit",
            Command::Pwd => "pwd",
            Command::Up => "up",
            Command::Cd(_) => "cd",
            Command::Ls(_) => "ls",
            Command::Cat(_) => "cat",
            Command::Add(_) => "add",
            Command::Rn { .. } => "rn",
            Command::Cp { .. } => "cp",
            Command::Mv { .. } => "mv",
            Command::Rm(_) => "rm",
            Command::Hash(_) => "hash",
            Command::Compress { .. } => "compress",
            Command::Decompress { .. } => "decompress",
            Command::Os(_) => "os",
            Command::Malformed { name, .. } => name,
            Command::Unknown(name) => name,
        }
    }
}

/// The `os --<flag>` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsQuery {
    /// `--eol`: the platform line ending.
    Eol,
    /// `--cpus`: CPU count, with model and clock where available.
    Cpus,
    /// `--homedir`
    HomeDir,
    /// `--username`: the operating system user, not the session username.
    Username,
    /// `--architecture`
    Architecture,
}

/// Whether a command did what was asked.
///
/// Failures are reported to the user and never end the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// What a dispatched command reports back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub outcome: Outcome,
    /// Printed verbatim; empty means nothing to print.
    pub message: String,
}

impl OperationResult {
    /// A successful result carrying the command's output.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Success,
            message: message.into(),
        }
    }

    /// A failed result carrying the text shown to the user.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failure,
            message: message.into(),
        }
    }

    /// `true` for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}
