use crate::archive;
use crate::builtin;
use crate::command::{Command, OperationResult};
use crate::digest;
use crate::error::{Error, Result};
use crate::os_info;
use crate::session::Session;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

pub const UNKNOWN_COMMAND: &str = "Unknown command. Please enter a valid command.";

pub fn farewell(session: &Session) -> String {
    format!(
        "Thank you for using File Manager, {}, goodbye!",
        session.display_name()
    )
}

/// Run one command against the session and report how it went.
///
/// This is the failure boundary of the file manager: handler errors and
/// panics are turned into a `Failure` result here and never reach the read
/// loop. Directory changes made by a failing handler have already been
/// rolled back by the directory changer.
pub async fn dispatch(command: Command, session: &mut Session) -> OperationResult {
    if let Command::Unknown(name) = &command {
        debug!(command = %name, "unknown command");
        return OperationResult::failure(UNKNOWN_COMMAND);
    }

    let name = command.name().to_string();
    debug!(command = %name, "dispatching");

    let outcome = AssertUnwindSafe(execute(command, session))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(Error::Panicked(panic_message(panic))));

    match outcome {
        Ok(message) => OperationResult::success(message),
        Err(err) => {
            warn!(command = %name, error = %err, "command failed");
            OperationResult::failure(format!("Operation failed: {err}"))
        }
    }
}

async fn execute(command: Command, session: &mut Session) -> Result<String> {
    match command {
        Command::Empty => Ok(String::new()),
        Command::Exit => {
            session.terminate();
            Ok(farewell(session))
        }
        Command::Pwd => Ok(builtin::pwd(session)),
        Command::Up => builtin::up(session).await,
        Command::Cd(target) => builtin::cd(session, &target).await,
        Command::Ls(target) => builtin::ls(session, target.as_deref()).await,
        Command::Cat(target) => builtin::cat(session, &target).await,
        Command::Add(name) => builtin::add(session, &name).await,
        Command::Rn { path, new_name } => builtin::rn(session, &path, &new_name).await,
        Command::Cp {
            source,
            destination,
        } => builtin::cp(session, &source, &destination).await,
        Command::Mv {
            source,
            destination,
        } => builtin::mv(session, &source, &destination).await,
        Command::Rm(target) => builtin::rm(session, &target).await,
        Command::Hash(target) => digest::hash(session, &target).await,
        Command::Compress {
            source,
            destination,
        } => archive::compress(session, &source, &destination).await,
        Command::Decompress {
            source,
            destination,
        } => archive::decompress(session, &source, &destination).await,
        Command::Os(query) => os_info::os_info(query).await,
        Command::Malformed { name, reason } => Err(Error::malformed(name, reason)),
        Command::Unknown(name) => Err(Error::Unknown(name)),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
