//! The only code path that moves a session between directories.
//!
//! Two modes are exposed on purpose: [`Session::change_permanently`] backs
//! `cd` and `up`, [`Session::with_temporary_change`] backs operations such as
//! `ls` that must leave the visible current directory untouched.

use crate::error::{Error, Result};
use crate::path;
use crate::session::Session;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Restores the session's directory on drop unless committed.
///
/// Covers early returns, errors and panics unwinding through an action.
struct DirectoryGuard<'a> {
    session: &'a mut Session,
    original: PathBuf,
    committed: bool,
}

impl<'a> DirectoryGuard<'a> {
    fn new(session: &'a mut Session) -> Self {
        let original = session.current_dir.clone();
        Self {
            session,
            original,
            committed: false,
        }
    }

    /// Move to `target`, passing through the target volume's root first when
    /// the volume changes.
    ///
    /// Navigation targets are confined to the session root, which always
    /// shares the original directory's volume, so `cd` and `ls` never take
    /// the drive change while the root is enforced.
    async fn switch_to(&mut self, target: &Path) -> Result<()> {
        if !path::same_volume(&self.original, target) {
            let volume_root = path::volume_root(target);
            info!(drive = %volume_root.display(), "changing drive");
            verify_directory(&volume_root).await?;
            self.session.current_dir = volume_root;
        }

        verify_directory(target).await?;
        self.session.current_dir = target.to_path_buf();
        Ok(())
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for DirectoryGuard<'_> {
    fn drop(&mut self) {
        if !self.committed && self.session.current_dir != self.original {
            debug!(
                from = %self.session.current_dir.display(),
                to = %self.original.display(),
                "restoring directory"
            );
            self.session.current_dir = std::mem::take(&mut self.original);
        }
    }
}

/// The directory must exist, be a directory and be listable.
async fn verify_directory(dir: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(dir)
        .await
        .map_err(|e| Error::io(dir, e))?;
    if !metadata.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()));
    }
    // Opening the listing proves the directory is readable.
    let _listing = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Error::io(dir, e))?;
    Ok(())
}

impl Session {
    /// Resolve `input` and reject targets above the session root.
    ///
    /// Climbing from the root fails even when `..` normalizes back onto it,
    /// as it does for a filesystem root.
    fn navigation_target(&self, input: &str) -> Result<PathBuf> {
        let target = self.resolve(input);
        let climbs = Path::new(input)
            .components()
            .any(|component| component == Component::ParentDir);
        if climbs && self.is_at_root() && target == self.root() {
            Err(Error::AlreadyAtRoot(self.root().to_path_buf()))
        } else if path::is_within_boundary(&target, self.root()) {
            Ok(target)
        } else if self.is_at_root() {
            Err(Error::AlreadyAtRoot(self.root().to_path_buf()))
        } else {
            Err(Error::OutsideRoot {
                target,
                root: self.root().to_path_buf(),
            })
        }
    }

    /// Move the session to `input` for good.
    ///
    /// On any failure the session stays where it was.
    pub async fn change_permanently(&mut self, input: &str) -> Result<&Path> {
        let target = self.navigation_target(input)?;

        let mut guard = DirectoryGuard::new(self);
        guard.switch_to(&target).await?;
        guard.commit();

        info!(dir = %self.current_dir.display(), "changed directory");
        Ok(self.current_dir())
    }

    /// Go to the parent directory; fails at the session root.
    pub async fn up(&mut self) -> Result<&Path> {
        if self.is_at_root() {
            return Err(Error::AlreadyAtRoot(self.root().to_path_buf()));
        }
        self.change_permanently("..").await
    }

    /// Run `action` with `input` as the effective directory, then restore.
    ///
    /// The action receives the resolved directory. If the switch itself
    /// fails the action is never invoked. The session's directory is put back
    /// on every exit path, including a panic inside the action.
    pub async fn with_temporary_change<F, Fut, T>(&mut self, input: &str, action: F) -> Result<T>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let target = self.navigation_target(input)?;

        let mut guard = DirectoryGuard::new(self);
        guard.switch_to(&target).await?;
        let dir = guard.session.current_dir.clone();
        action(dir).await
    }
}
