use crate::command::{Command, OperationResult};
use crate::config::Config;
use crate::dispatcher::{self, dispatch};
use crate::parser;
use crate::path;
use crate::session::Session;
use anyhow::{Context, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PROMPT: &str = "> ";

/// The interactive read loop of the file manager.
///
/// Owns the [`Session`] and an output sink. Each line goes through parse,
/// dispatch and report, followed by the current directory, whatever the
/// outcome. Commands run one at a time to completion.
///
/// Example
/// ```no_run
/// use file_manager::{Config, Interpreter};
/// let mut fm = Interpreter::from_config(&Config::default(), std::io::stdout()).unwrap();
/// fm.repl().unwrap();
/// ```
pub struct Interpreter<W: Write = io::Stdout> {
    session: Session,
    out: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(session: Session, out: W) -> Self {
        Self { session, out }
    }

    /// Build the session from startup settings.
    ///
    /// Failing to find a usable start directory is the only fatal error of
    /// the file manager.
    pub fn from_config(config: &Config, out: W) -> anyhow::Result<Self> {
        let home = match &config.home {
            Some(home) => absolute(home)?,
            None => dirs::home_dir().context("cannot determine the home directory")?,
        };
        ensure_directory(&home, "start directory")?;

        let root = match &config.root {
            Some(root) => absolute(root)?,
            None => path::volume_root(&home),
        };
        ensure_directory(&root, "root directory")?;

        let session = Session::new(&home, &root, config.username.clone())
            .context("start directory must be inside the root directory")?;
        info!(
            home = %session.current_dir().display(),
            root = %session.root().display(),
            "session started"
        );
        Ok(Self::new(session, out))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Print the greeting and the starting directory.
    pub fn greet(&mut self) -> io::Result<()> {
        if self.session.username().is_none() {
            writeln!(
                self.out,
                "Please provide a username using the --username argument."
            )?;
        }
        writeln!(
            self.out,
            "Welcome to the File Manager, {}!",
            self.session.display_name()
        )?;
        self.print_current_dir()
    }

    /// Process one input line. Does nothing once the session is terminated.
    pub async fn execute_line(&mut self, line: &str) -> io::Result<()> {
        if !self.session.is_running() {
            return Ok(());
        }

        let command = parser::parse_line(line);
        if command == Command::Exit {
            return self.farewell();
        }

        let result = dispatch(command, &mut self.session).await;
        self.report(&result)?;
        self.print_current_dir()
    }

    /// Say goodbye and terminate the session.
    pub fn farewell(&mut self) -> io::Result<()> {
        if !self.session.is_running() {
            return Ok(());
        }
        writeln!(self.out, "{}", dispatcher::farewell(&self.session))?;
        self.session.terminate();
        self.out.flush()
    }

    /// Read lines from the terminal until `.exit`, Ctrl-C or end of input.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start the I/O runtime")?;
        let mut rl = DefaultEditor::new()?;

        self.greet()?;
        while self.session.is_running() {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    runtime.block_on(self.execute_line(&line))?;
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    debug!("input closed");
                    self.farewell()?;
                }
                Err(err) => {
                    self.farewell()?;
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }

    fn report(&mut self, result: &OperationResult) -> io::Result<()> {
        if !result.message.is_empty() {
            writeln!(self.out, "{}", result.message)?;
        }
        Ok(())
    }

    fn print_current_dir(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "You are currently in {}",
            self.session.current_dir().display()
        )?;
        self.out.flush()
    }
}

fn absolute(dir: &Path) -> anyhow::Result<PathBuf> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        let cwd = std::env::current_dir().context("cannot read the working directory")?;
        Ok(cwd.join(dir))
    }
}

fn ensure_directory(dir: &Path, what: &str) -> anyhow::Result<()> {
    let metadata = std::fs::metadata(dir)
        .with_context(|| format!("cannot access {what} {}", dir.display()))?;
    if !metadata.is_dir() {
        bail!("{what} {} is not a directory", dir.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(interpreter: Interpreter<Vec<u8>>) -> String {
        String::from_utf8(interpreter.into_output()).unwrap()
    }

    #[tokio::test]
    async fn test_every_command_is_followed_by_current_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::new(tmp.path(), tmp.path(), Some("ann".to_string())).unwrap();
        let mut fm = Interpreter::new(session, Vec::new());

        fm.execute_line("bogus").await.unwrap();
        fm.execute_line("").await.unwrap();

        let here = format!("You are currently in {}", tmp.path().display());
        let expected = format!(
            "Unknown command. Please enter a valid command.\n{here}\n{here}\n"
        );
        assert_eq!(transcript(fm), expected);
    }

    #[tokio::test]
    async fn test_exit_skips_reporting_and_stops_processing() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::new(tmp.path(), tmp.path(), Some("ann".to_string())).unwrap();
        let mut fm = Interpreter::new(session, Vec::new());

        fm.execute_line("  .exit ").await.unwrap();
        fm.execute_line("pwd").await.unwrap();
        fm.farewell().unwrap();

        assert!(!fm.session().is_running());
        assert_eq!(
            transcript(fm),
            "Thank you for using File Manager, ann, goodbye!\n"
        );
    }

    #[test]
    fn test_greeting_without_username() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::new(tmp.path(), tmp.path(), None).unwrap();
        let mut fm = Interpreter::new(session, Vec::new());
        fm.greet().unwrap();

        let out = transcript(fm);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Please provide a username using the --username argument.");
        assert_eq!(lines[1], "Welcome to the File Manager, Guest!");
        assert!(lines[2].starts_with("You are currently in "));
    }

    #[test]
    fn test_from_config_validates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path().join("home");
        std::fs::create_dir(&home).unwrap();

        let config = Config {
            home: Some(home.clone()),
            root: Some(tmp.path().to_path_buf()),
            ..Config::default()
        };
        let fm = Interpreter::from_config(&config, Vec::new()).unwrap();
        assert_eq!(fm.session().current_dir(), home);

        let missing = Config {
            home: Some(tmp.path().join("ghost")),
            ..Config::default()
        };
        assert!(Interpreter::from_config(&missing, Vec::new()).is_err());

        let outside = Config {
            home: Some(tmp.path().to_path_buf()),
            root: Some(home),
            ..Config::default()
        };
        assert!(Interpreter::from_config(&outside, Vec::new()).is_err());
    }
}
