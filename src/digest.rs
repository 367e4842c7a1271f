use crate::builtin::existing_file;
use crate::error::{Error, Result};
use crate::session::Session;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 64 * 1024;

pub(crate) async fn hash(session: &Session, target: &str) -> Result<String> {
    let path = existing_file(session, target).await?;
    sha256_file(&path).await
}

/// Lowercase hex SHA-256 of the file's contents, read in chunks.
pub async fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).await.map_err(|e| Error::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buf).await.map_err(|e| Error::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[tokio::test]
    async fn test_known_digests() {
        let tmp = tempfile::tempdir().unwrap();
        let hello = tmp.path().join("hello.txt");
        let empty = tmp.path().join("empty");
        std::fs::write(&hello, "hello").unwrap();
        std::fs::write(&empty, "").unwrap();

        assert_eq!(
            sha256_file(&hello).await.unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            sha256_file(&empty).await.unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_hash_resolves_against_session() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("hello.txt"), "hello").unwrap();
        let session = Session::new(tmp.path(), tmp.path(), None).unwrap();

        let digest = hash(&session, "hello.txt").await.unwrap();
        assert!(digest.starts_with("2cf24dba"));

        let missing = hash(&session, "missing.txt").await.unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }
}
