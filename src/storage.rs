// Flat-directory image storage.
// Every stored image is a single file directly under the storage root, keyed
// by its upload-time filename. There is no locking: concurrent writers to the
// same identifier race and the last completed write wins.

use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid image identifier: {0}")]
    InvalidId(String),

    #[error("image not found: {0}")]
    NotFound(String),

    #[error("failed to create image file: {0}")]
    CreateFailed(String),

    #[error("failed to write image data: {0}")]
    WriteFailed(String),

    #[error("failed to open image file: {0}")]
    OpenFailed(String),

    #[error("failed to read storage directory: {0}")]
    ListFailed(String),
}

/// Adapter over the single flat directory holding all uploaded images.
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Opens the store at `root`, creating the directory if it is missing.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StoreError::CreateFailed(format!("{}: {}", root.display(), e))
        })?;

        Ok(ImageStore { root })
    }

    /// Resolves an identifier to a path inside the root, rejecting anything
    /// that could escape the flat namespace.
    fn image_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.root.join(id))
    }

    /// Enumerates every entry in the storage directory. No filtering: entry
    /// names are returned as-is, in whatever order the filesystem yields
    /// them. Non-UTF-8 names are included lossily.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = fs::read_dir(&self.root).await.map_err(|e| {
            StoreError::ListFailed(format!("{}: {}", self.root.display(), e))
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StoreError::ListFailed(format!("{}: {}", self.root.display(), e))
        })? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        Ok(names)
    }

    /// Creates (or truncates) the file for `id` and returns a writer for
    /// streaming the upload body into it. An existing image with the same
    /// identifier is overwritten.
    pub async fn create(&self, id: &str) -> Result<ImageWriter, StoreError> {
        let path = self.image_path(id)?;

        let file = fs::File::create(&path).await.map_err(|e| {
            StoreError::CreateFailed(format!("{}: {}", path.display(), e))
        })?;

        Ok(ImageWriter {
            file,
            path,
            bytes_written: 0,
        })
    }

    /// Opens the image for `id` as a byte stream. There is no existence
    /// pre-check: a failed open with `NotFound` kind is what signals a
    /// missing image.
    pub async fn read_stream(&self, id: &str) -> Result<ReaderStream<fs::File>, StoreError> {
        let path = self.image_path(id)?;

        let file = fs::File::open(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound(id.to_string()),
            _ => StoreError::OpenFailed(format!("{}: {}", path.display(), e)),
        })?;

        Ok(ReaderStream::new(file))
    }

    #[cfg(test)]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

/// In-progress streamed write of one uploaded image.
///
/// Dropping the writer without calling [`ImageWriter::finish`] leaves
/// whatever bytes were already written on disk; a failed upload is not
/// rolled back.
pub struct ImageWriter {
    file: fs::File,
    path: PathBuf,
    bytes_written: u64,
}

impl ImageWriter {
    /// Appends one chunk of the upload body to the destination file. The
    /// chunk is flushed through to the OS before returning, so an aborted
    /// upload leaves exactly the chunks written so far on disk.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StoreError> {
        self.file.write_all(chunk).await.map_err(|e| {
            StoreError::WriteFailed(format!("{}: {}", self.path.display(), e))
        })?;
        self.file.flush().await.map_err(|e| {
            StoreError::WriteFailed(format!("{}: {}", self.path.display(), e))
        })?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    /// Flushes the file to disk and returns the number of bytes written.
    pub async fn finish(self) -> Result<u64, StoreError> {
        self.file.sync_all().await.map_err(|e| {
            StoreError::WriteFailed(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(self.bytes_written)
    }
}

/// Validates a client-supplied identifier before any filesystem join.
/// The namespace is flat, so separators, traversal sequences, and the
/// directory self-reference are all rejected up front.
fn validate_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() {
        return Err(StoreError::InvalidId("identifier is empty".to_string()));
    }
    if id == "." || id.contains("..") {
        return Err(StoreError::InvalidId(format!(
            "{:?} contains a path traversal sequence",
            id
        )));
    }
    if id.contains('/') || id.contains('\\') || id.contains('\0') {
        return Err(StoreError::InvalidId(format!(
            "{:?} contains a path separator",
            id
        )));
    }
    Ok(())
}
