//! An interactive, line-oriented file manager.
//!
//! The crate is built around a [`Session`] that owns the current directory of
//! the user. Input lines are parsed into [`Command`] values by
//! [`parser::parse_line`], executed by [`dispatch`], and the outcome is
//! reported by the [`Interpreter`] read loop, which prints the current
//! directory after every command.
//!
//! Directory changes only ever happen through the session's directory
//! changer, either permanently (`cd`, `up`) or scoped to a single operation
//! (`ls`), so a failing command can never leave the session somewhere
//! unexpected.

mod archive;
mod builtin;
pub mod command;
pub mod config;
mod digest;
mod directory;
pub mod dispatcher;
pub mod error;
mod interpreter;
mod os_info;
pub mod parser;
pub mod path;
pub mod session;

pub use command::{Command, OperationResult, OsQuery, Outcome};
pub use config::Config;
pub use digest::sha256_file;
pub use dispatcher::dispatch;
pub use error::{Error, ErrorKind, Result};
/// The interactive read loop; see [`Interpreter::repl`].
pub use interpreter::Interpreter;
pub use session::{Session, SessionState};
