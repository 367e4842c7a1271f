//! Brotli compression handlers.
//!
//! The brotli codec is synchronous, so each file is processed on the
//! blocking pool and awaited; the dispatcher still sees one command at a time.

use crate::builtin::{ensure_absent, existing_file, output_path};
use crate::error::{Error, Result};
use crate::session::Session;
use brotli::Decompressor;
use brotli::enc::BrotliEncoderParams;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

const BUFFER_SIZE: usize = 4096;
const QUALITY: i32 = 11;
const LG_WINDOW: i32 = 22;
const EXTENSION: &str = "br";

/// Compress a file, or every regular file directly inside a directory.
///
/// In directory mode each file is reported on its own line and one failure
/// does not stop the rest.
pub(crate) async fn compress(session: &Session, source: &str, destination: &str) -> Result<String> {
    let source = session.resolve(source);
    let destination = session.resolve(destination);
    let metadata = fs::metadata(&source)
        .await
        .map_err(|e| Error::io(&source, e))?;

    if metadata.is_dir() {
        return compress_directory(&source, &destination).await;
    }

    let target = compressed_target(&source, &destination).await?;
    compress_file(source.clone(), target.clone()).await?;
    Ok(format!(
        "Compressed {} to {}",
        source.display(),
        target.display()
    ))
}

pub(crate) async fn decompress(session: &Session, source: &str, destination: &str) -> Result<String> {
    let source = existing_file(session, source).await?;
    let file_name = source
        .file_name()
        .ok_or_else(|| Error::NotAFile(source.clone()))?;
    let restored_name = Path::new(file_name)
        .extension()
        .filter(|ext| *ext == EXTENSION)
        .and_then(|_| Path::new(file_name).file_stem())
        .unwrap_or(file_name);

    let target = output_path(&session.resolve(destination), restored_name).await;
    ensure_absent(&target).await?;
    decompress_file(source.clone(), target.clone()).await?;
    Ok(format!(
        "Decompressed {} to {}",
        source.display(),
        target.display()
    ))
}

async fn compress_directory(source: &Path, destination: &Path) -> Result<String> {
    let metadata = fs::metadata(destination)
        .await
        .map_err(|e| Error::io(destination, e))?;
    if !metadata.is_dir() {
        return Err(Error::NotADirectory(destination.to_path_buf()));
    }

    let mut files = Vec::new();
    let mut entries = fs::read_dir(source)
        .await
        .map_err(|e| Error::io(source, e))?;
    while let Some(entry) = entries.next_entry().await.map_err(|e| Error::io(source, e))? {
        if entry.file_type().await.is_ok_and(|t| t.is_file()) {
            files.push(entry.path());
        }
    }
    files.sort();

    if files.is_empty() {
        return Ok(format!("No files to compress in {}", source.display()));
    }

    let mut report = Vec::with_capacity(files.len());
    for file in files {
        let outcome = match compressed_target(&file, destination).await {
            Ok(target) => compress_file(file.clone(), target.clone())
                .await
                .map(|()| target),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(target) => report.push(format!(
                "Compressed {} to {}",
                file.display(),
                target.display()
            )),
            Err(e) => {
                warn!(file = %file.display(), error = %e, "skipping file");
                report.push(format!("Operation failed: {e}"));
            }
        }
    }
    Ok(report.join("\n"))
}

async fn compressed_target(source: &Path, destination: &Path) -> Result<PathBuf> {
    let mut name = source
        .file_name()
        .ok_or_else(|| Error::NotAFile(source.to_path_buf()))?
        .to_os_string();
    name.push(".");
    name.push(EXTENSION);

    let target = output_path(destination, &name).await;
    ensure_absent(&target).await?;
    Ok(target)
}

async fn compress_file(source: PathBuf, target: PathBuf) -> Result<()> {
    run_blocking(move || {
        let mut input = File::open(&source).map_err(|e| Error::io(&source, e))?;
        let mut output = create_new(&target)?;
        encode(&mut input, &mut output)
            .and_then(|()| output.sync_all())
            .map_err(|e| discard(&target, e))?;
        info!(source = %source.display(), target = %target.display(), "compressed");
        Ok(())
    })
    .await
}

/// Write a complete brotli stream, final block included, or fail.
fn encode<R: Read, W: Write>(input: &mut R, output: &mut W) -> io::Result<()> {
    let params = BrotliEncoderParams {
        quality: QUALITY,
        lgwin: LG_WINDOW,
        ..BrotliEncoderParams::default()
    };
    brotli::BrotliCompress(input, output, &params)?;
    output.flush()
}

async fn decompress_file(source: PathBuf, target: PathBuf) -> Result<()> {
    run_blocking(move || {
        let input = File::open(&source).map_err(|e| Error::io(&source, e))?;
        let mut output = create_new(&target)?;
        let mut reader = Decompressor::new(input, BUFFER_SIZE);
        io::copy(&mut reader, &mut output)
            .and_then(|_| output.sync_all())
            .map_err(|e| discard(&target, e))?;
        info!(source = %source.display(), target = %target.display(), "decompressed");
        Ok(())
    })
    .await
}

fn create_new(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| Error::io(path, e))
}

/// Drop a partially written output and report the error against it.
fn discard(target: &Path, err: io::Error) -> Error {
    let _ = std::fs::remove_file(target);
    Error::io(target, err)
}

async fn run_blocking<F>(job: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| Error::Panicked(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::fs as stdfs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Session) {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path().join("work");
        stdfs::create_dir_all(work.join("out")).unwrap();
        stdfs::create_dir_all(work.join("batch")).unwrap();
        stdfs::write(work.join("text.txt"), "lorem ipsum ".repeat(200)).unwrap();
        let session = Session::new(&work, tmp.path(), None).unwrap();
        (tmp, session)
    }

    #[tokio::test]
    async fn test_compress_then_decompress_restores_content() {
        let (_tmp, session) = fixture();
        let dir = session.current_dir().to_path_buf();

        let msg = compress(&session, "text.txt", "out").await.unwrap();
        assert!(msg.contains("text.txt.br"));
        let compressed = stdfs::read(dir.join("out/text.txt.br")).unwrap();
        assert!(compressed.len() < 2400);

        decompress(&session, "out/text.txt.br", "batch").await.unwrap();
        assert_eq!(
            stdfs::read_to_string(dir.join("batch/text.txt")).unwrap(),
            "lorem ipsum ".repeat(200)
        );
    }

    #[tokio::test]
    async fn test_compress_refuses_to_overwrite() {
        let (_tmp, session) = fixture();
        compress(&session, "text.txt", "out").await.unwrap();
        let err = compress(&session, "text.txt", "out").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_decompress_garbage_leaves_no_output() {
        let (_tmp, session) = fixture();
        let dir = session.current_dir().to_path_buf();
        stdfs::write(dir.join("junk.br"), b"definitely not brotli").unwrap();

        assert!(decompress(&session, "junk.br", "out").await.is_err());
        assert!(!dir.join("out/junk").exists());
    }

    #[tokio::test]
    async fn test_directory_compression_reports_each_file() {
        let (_tmp, session) = fixture();
        let dir = session.current_dir().to_path_buf();
        stdfs::write(dir.join("batch/one.txt"), "1").unwrap();
        stdfs::write(dir.join("batch/two.txt"), "2").unwrap();
        // Pre-existing output makes the first file fail.
        stdfs::write(dir.join("out/one.txt.br"), "taken").unwrap();

        let report = compress(&session, "batch", "out").await.unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Operation failed"));
        assert!(lines[1].starts_with("Compressed") && lines[1].contains("two.txt.br"));
        assert!(dir.join("out/two.txt.br").exists());
    }

    /// Accepts `room` bytes, then fails like a full disk.
    struct FullDisk {
        room: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.room == 0 {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "no space left"));
            }
            let n = buf.len().min(self.room);
            self.room -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_encode_reports_failure_while_finishing_stream() {
        // Short input fits in the final block, so nothing is written before finishing.
        let mut input: &[u8] = b"tiny";
        let err = encode(&mut input, &mut FullDisk { room: 2 }).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::StorageFull);

        let mut input: &[u8] = b"tiny";
        let mut sink = Vec::new();
        encode(&mut input, &mut sink).unwrap();
        let mut decoded = String::new();
        Decompressor::new(&sink[..], BUFFER_SIZE)
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "tiny");
    }

    #[tokio::test]
    async fn test_compress_missing_source() {
        let (_tmp, session) = fixture();
        let err = compress(&session, "nope.txt", "out").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
