use crate::error::{Error, Result};
use crate::path;
use std::path::{Path, PathBuf};

/// Lifecycle of an interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting input.
    Running,
    /// Absorbing: no further input is processed.
    Terminated,
}

/// The single owner of the "current directory" for a file manager session.
///
/// The current directory is kept here rather than in the process, and it is
/// only ever changed through the directory changer (see
/// [`Session::change_permanently`] and [`Session::with_temporary_change`]).
/// Handlers receive `&mut Session`, so at most one command can touch it at a
/// time.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) current_dir: PathBuf,
    root: PathBuf,
    username: Option<String>,
    state: SessionState,
}

impl Session {
    /// Start a session in `home`, confined to `root`.
    ///
    /// Both paths are normalized. Fails if `home` is not inside `root`;
    /// existence is checked by the caller at startup.
    pub fn new(home: &Path, root: &Path, username: Option<String>) -> Result<Self> {
        let current_dir = path::normalize(home);
        let root = path::normalize(root);
        if !path::is_within_boundary(&current_dir, &root) {
            return Err(Error::OutsideRoot {
                target: current_dir,
                root,
            });
        }
        Ok(Self {
            current_dir,
            root,
            username,
            state: SessionState::Running,
        })
    }

    /// The directory relative paths resolve against.
    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// The directory navigation may not climb above.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configured username, if any.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Name used in greetings and farewells.
    pub fn display_name(&self) -> &str {
        self.username().unwrap_or("Guest")
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// `true` until [`Session::terminate`] is called.
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Move to [`SessionState::Terminated`]. Calling it again is a no-op.
    pub fn terminate(&mut self) {
        self.state = SessionState::Terminated;
    }

    /// Whether the current directory is the session root itself.
    pub fn is_at_root(&self) -> bool {
        self.current_dir == self.root
    }

    /// Resolve user input against the current directory.
    pub fn resolve(&self, input: &str) -> PathBuf {
        path::resolve(input, &self.current_dir)
    }
}
