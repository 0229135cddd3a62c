use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::mime::extension_for_mime;

/// Copy buffer size used while spooling a source
pub const SPOOL_BUFFER_SIZE: usize = 128 * 1024;

const SPOOL_PREFIX: &str = "codimd-share";

pub type SourceReader = Box<dyn AsyncRead + Send + Unpin>;

/// Something that can hand out a readable stream of image bytes once.
pub trait ImageSource: Send + Sync {
    /// Human readable description used in logs
    fn describe(&self) -> String;

    fn open(&self) -> io::Result<SourceReader>;
}

/// An image on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> io::Result<SourceReader> {
        let file = std::fs::File::open(&self.path)?;
        Ok(Box::new(tokio::fs::File::from_std(file)))
    }
}

/// Image bytes already held in memory.
#[derive(Debug, Clone)]
pub struct BytesSource {
    name: String,
    data: Vec<u8>,
}

impl BytesSource {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

impl ImageSource for BytesSource {
    fn describe(&self) -> String {
        format!("{} ({} bytes in memory)", self.name, self.data.len())
    }

    fn open(&self) -> io::Result<SourceReader> {
        Ok(Box::new(io::Cursor::new(self.data.clone())))
    }
}

/// The process' standard input.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinSource;

impl ImageSource for StdinSource {
    fn describe(&self) -> String {
        "<stdin>".to_string()
    }

    fn open(&self) -> io::Result<SourceReader> {
        Ok(Box::new(tokio::io::stdin()))
    }
}

#[derive(Error, Debug)]
pub enum SpoolError {
    #[error("could not open {source_name}: {error}")]
    Open { source_name: String, error: io::Error },

    #[error("could not create spool file in {dir:?}: {error}")]
    Create { dir: PathBuf, error: io::Error },

    #[error("failed while copying {source_name}: {error}")]
    Copy { source_name: String, error: io::Error },
}

/// A local copy of the source bytes, owned by a single request.
///
/// The file is removed when this value is dropped unless [`SpooledFile::keep`]
/// was called.
#[derive(Debug)]
pub struct SpooledFile {
    path: PathBuf,
    size: u64,
    keep: bool,
}

impl SpooledFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            size: 0,
            keep: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Detach the file from cleanup and return its path.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for SpooledFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed spool file {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove spool file {} (non-critical): {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Copy the whole source into a fresh file under `spool_dir`.
pub async fn spool_source(
    source: &dyn ImageSource,
    mime_type: &str,
    spool_dir: &Path,
) -> Result<SpooledFile, SpoolError> {
    let mut reader = source.open().map_err(|error| SpoolError::Open {
        source_name: source.describe(),
        error,
    })?;

    tokio::fs::create_dir_all(spool_dir)
        .await
        .map_err(|error| SpoolError::Create {
            dir: spool_dir.to_path_buf(),
            error,
        })?;

    let path = spool_dir.join(format!(
        "{}-{}.{}",
        SPOOL_PREFIX,
        uuid::Uuid::new_v4(),
        extension_for_mime(mime_type)
    ));

    let mut out = tokio::fs::File::create(&path)
        .await
        .map_err(|error| SpoolError::Create {
            dir: spool_dir.to_path_buf(),
            error,
        })?;

    // From here on a partial file is removed on every error path
    let mut spooled = SpooledFile::new(path);

    let copy_error = |error: io::Error| SpoolError::Copy {
        source_name: source.describe(),
        error,
    };

    let mut buffer = vec![0u8; SPOOL_BUFFER_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer).await.map_err(copy_error)?;
        if bytes_read == 0 {
            break;
        }
        out.write_all(&buffer[..bytes_read])
            .await
            .map_err(copy_error)?;
        spooled.size += bytes_read as u64;
    }

    out.flush().await.map_err(copy_error)?;
    drop(out);

    log::debug!(
        "Spooled {} bytes from {} to {}",
        spooled.size,
        source.describe(),
        spooled.path.display()
    );

    Ok(spooled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    struct FailingReader {
        served: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.served {
                Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "provider went away",
                )))
            } else {
                self.served = true;
                buf.put_slice(b"partial");
                Poll::Ready(Ok(()))
            }
        }
    }

    struct FailingSource;

    impl ImageSource for FailingSource {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        fn open(&self) -> io::Result<SourceReader> {
            Ok(Box::new(FailingReader { served: false }))
        }
    }

    #[tokio::test]
    async fn test_spool_copies_all_bytes() {
        let dir = tempfile::tempdir().unwrap();
        // Larger than one buffer so the loop runs more than once
        let data: Vec<u8> = (0..(SPOOL_BUFFER_SIZE * 2 + 17))
            .map(|i| (i % 251) as u8)
            .collect();
        let source = BytesSource::new("big.png", data.clone());

        let spooled = spool_source(&source, "image/png", dir.path()).await.unwrap();

        assert_eq!(spooled.len(), data.len() as u64);
        assert!(spooled.file_name().starts_with("codimd-share-"));
        assert!(spooled.file_name().ends_with(".png"));
        assert_eq!(std::fs::read(spooled.path()).unwrap(), data);
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = BytesSource::new("a.gif", b"GIF89a".to_vec());

        let spooled = spool_source(&source, "image/gif", dir.path()).await.unwrap();
        let path = spooled.path().to_path_buf();
        assert!(path.exists());

        drop(spooled);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_keep_detaches_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = BytesSource::new("a.jpg", b"\xFF\xD8\xFF".to_vec());

        let spooled = spool_source(&source, "image/jpeg", dir.path()).await.unwrap();
        let path = spooled.keep();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "jpg");
    }

    #[tokio::test]
    async fn test_missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("nope.png"));

        let result = spool_source(&source, "image/png", dir.path()).await;
        match result {
            Err(SpoolError::Open { error, .. }) => {
                assert_eq!(error.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("expected open error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_failure_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();

        let result = spool_source(&FailingSource, "image/png", dir.path()).await;
        assert!(matches!(result, Err(SpoolError::Copy { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
