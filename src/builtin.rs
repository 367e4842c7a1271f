//! Navigation and plain file handlers.
//!
//! Every handler takes the session explicitly and resolves user paths
//! against it; none of them look at the process working directory.

use crate::error::{Error, Result};
use crate::session::Session;
use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub(crate) fn pwd(session: &Session) -> String {
    session.current_dir().display().to_string()
}

pub(crate) async fn cd(session: &mut Session, target: &str) -> Result<String> {
    session.change_permanently(target).await?;
    Ok(String::new())
}

pub(crate) async fn up(session: &mut Session) -> Result<String> {
    session.up().await?;
    Ok(String::new())
}

/// List `target` (default: the current directory) inside a scoped
/// directory change; the session ends up where it started.
pub(crate) async fn ls(session: &mut Session, target: Option<&str>) -> Result<String> {
    session
        .with_temporary_change(target.unwrap_or("."), list_directory)
        .await
}

async fn list_directory(dir: PathBuf) -> Result<String> {
    let mut entries = fs::read_dir(&dir).await.map_err(|e| Error::io(&dir, e))?;
    let mut listing = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| Error::io(&dir, e))? {
        // Follow symlinks so a link to a folder is listed as a folder.
        let is_dir = match fs::metadata(entry.path()).await {
            Ok(metadata) => metadata.is_dir(),
            Err(_) => entry.file_type().await.is_ok_and(|t| t.is_dir()),
        };
        listing.push((is_dir, entry.file_name().to_string_lossy().into_owned()));
    }

    listing.sort_by(|(a_dir, a_name), (b_dir, b_name)| {
        b_dir
            .cmp(a_dir)
            .then_with(|| a_name.to_lowercase().cmp(&b_name.to_lowercase()))
            .then_with(|| a_name.cmp(b_name))
    });

    let mut out = String::from("Type\tName");
    for (is_dir, name) in listing {
        out.push('\n');
        out.push_str(if is_dir { "Folder" } else { "File" });
        out.push('\t');
        out.push_str(&name);
    }
    Ok(out)
}

pub(crate) async fn cat(session: &Session, target: &str) -> Result<String> {
    let path = existing_file(session, target).await?;
    let content = fs::read_to_string(&path)
        .await
        .map_err(|e| Error::io(&path, e))?;
    Ok(content.strip_suffix('\n').unwrap_or(&content).to_string())
}

pub(crate) async fn add(session: &Session, name: &str) -> Result<String> {
    ensure_bare_name("add", name)?;
    let path = session.current_dir().join(name);
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(|e| Error::io(&path, e))?;
    Ok(format!("Created file {name}"))
}

pub(crate) async fn rn(session: &Session, target: &str, new_name: &str) -> Result<String> {
    ensure_bare_name("rn", new_name)?;
    let source = session.resolve(target);
    fs::metadata(&source)
        .await
        .map_err(|e| Error::io(&source, e))?;

    let renamed = match source.parent() {
        Some(parent) => parent.join(new_name),
        None => return Err(Error::malformed("rn", "cannot rename the filesystem root")),
    };
    ensure_absent(&renamed).await?;

    fs::rename(&source, &renamed)
        .await
        .map_err(|e| Error::io(&source, e))?;
    Ok(format!("Renamed {target} to {new_name}"))
}

pub(crate) async fn cp(session: &Session, source: &str, destination: &str) -> Result<String> {
    let source = existing_file(session, source).await?;
    let destination = copy_destination(session, &source, destination).await?;
    copy_file(&source, &destination).await?;
    Ok(format!(
        "Copied {} to {}",
        source.display(),
        destination.display()
    ))
}

/// Rename in place, or copy then delete the source across filesystems.
pub(crate) async fn mv(session: &Session, source: &str, destination: &str) -> Result<String> {
    let source = existing_file(session, source).await?;
    let destination = copy_destination(session, &source, destination).await?;
    match fs::rename(&source, &destination).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(source = %source.display(), "moving across filesystems");
            copy_then_remove(&source, &destination).await?;
        }
        Err(e) => return Err(Error::io(&source, e)),
    }
    Ok(format!(
        "Moved {} to {}",
        source.display(),
        destination.display()
    ))
}

pub(crate) async fn rm(session: &Session, target: &str) -> Result<String> {
    let path = existing_file(session, target).await?;
    fs::remove_file(&path)
        .await
        .map_err(|e| Error::io(&path, e))?;
    Ok(format!("Removed {}", path.display()))
}

/// Resolve `target` and make sure it names an existing non-directory.
pub(crate) async fn existing_file(session: &Session, target: &str) -> Result<PathBuf> {
    let path = session.resolve(target);
    let metadata = fs::metadata(&path)
        .await
        .map_err(|e| Error::io(&path, e))?;
    if metadata.is_dir() {
        return Err(Error::NotAFile(path));
    }
    Ok(path)
}

/// Where a file named `file_name` lands when written to `destination`:
/// inside it if it is an existing directory, at `destination` otherwise.
pub(crate) async fn output_path(destination: &Path, file_name: &OsStr) -> PathBuf {
    match fs::metadata(destination).await {
        Ok(metadata) if metadata.is_dir() => destination.join(file_name),
        _ => destination.to_path_buf(),
    }
}

pub(crate) async fn ensure_absent(path: &Path) -> Result<()> {
    match fs::try_exists(path).await {
        Ok(false) => Ok(()),
        Ok(true) => Err(Error::AlreadyExists(path.to_path_buf())),
        Err(e) => Err(Error::io(path, e)),
    }
}

async fn copy_destination(session: &Session, source: &Path, destination: &str) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| Error::NotAFile(source.to_path_buf()))?;
    let destination = output_path(&session.resolve(destination), file_name).await;
    ensure_absent(&destination).await?;
    Ok(destination)
}

/// Stream `source` into a new file at `destination`.
///
/// Never overwrites; a partially written destination is removed on failure.
async fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    let mut reader = File::open(source)
        .await
        .map_err(|e| Error::io(source, e))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .await
        .map_err(|e| Error::io(destination, e))?;

    let copied = match tokio::io::copy(&mut reader, &mut writer).await {
        Ok(bytes) => writer.flush().await.map(|()| bytes),
        Err(e) => Err(e),
    };
    drop(writer);

    match copied {
        Ok(bytes) => {
            debug!(
                source = %source.display(),
                destination = %destination.display(),
                bytes,
                "copied file"
            );
            Ok(())
        }
        Err(e) => {
            warn!(destination = %destination.display(), error = %e, "copy failed, removing partial file");
            let _ = fs::remove_file(destination).await;
            Err(Error::io(destination, e))
        }
    }
}

/// Either both files are left as they were, or only `destination` remains.
async fn copy_then_remove(source: &Path, destination: &Path) -> Result<()> {
    copy_file(source, destination).await?;
    if let Err(e) = fs::remove_file(source).await {
        warn!(source = %source.display(), error = %e, "cannot remove source, undoing copy");
        let _ = fs::remove_file(destination).await;
        return Err(Error::io(source, e));
    }
    Ok(())
}

/// `name` must be a single plain path component.
fn ensure_bare_name(command: &str, name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(component)), None) if component == OsStr::new(name) => Ok(()),
        _ => Err(Error::malformed(
            command,
            format!("`{name}` must be a plain file name"),
        )),
    }
}
