//! Handles to files uploaded through `multipart/form-data`.

use std::fmt;
use std::io::{self, Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use http::HeaderMap;
use tempfile::NamedTempFile;

/// Where an uploaded file's content lives.
#[derive(Clone)]
enum FileContent {
    Memory(Bytes),
    // Deleted from disk when the last handle is dropped.
    Spooled(Arc<NamedTempFile>),
}

/// A file that has been uploaded via multipart form.
///
/// Small files are held in memory; files that do not fit in the remaining
/// memory budget are spooled to a temporary file that is removed once every
/// clone of the handle has been dropped. Handles are only guaranteed to be
/// readable while the request is being handled; copy the content out to keep
/// it longer.
#[derive(Clone)]
pub struct FileHandle {
    name: String,
    file_name: String,
    content_type: Option<mime::Mime>,
    headers: HeaderMap,
    size: u64,
    content: FileContent,
}

impl FileHandle {
    /// Creates an in-memory file handle.
    #[must_use]
    pub fn in_memory(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<mime::Mime>,
        data: Bytes,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            content_type,
            headers: HeaderMap::new(),
            size: data.len() as u64,
            content: FileContent::Memory(data),
        }
    }

    pub(crate) fn spooled(
        name: String,
        file_name: String,
        content_type: Option<mime::Mime>,
        headers: HeaderMap,
        size: u64,
        file: NamedTempFile,
    ) -> Self {
        Self {
            name,
            file_name,
            content_type,
            headers,
            size,
            content: FileContent::Spooled(Arc::new(file)),
        }
    }

    pub(crate) fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Get the form field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the original file name sent by the client.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Get the declared MIME type of the part.
    #[must_use]
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.content_type.as_ref()
    }

    /// Get the headers of the multipart part.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the file size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Check if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns `true` if the content was spooled to temporary storage.
    #[must_use]
    pub fn is_spooled(&self) -> bool {
        matches!(self.content, FileContent::Spooled(_))
    }

    /// Returns the path of the spool file, if the content was spooled.
    #[must_use]
    pub fn spool_path(&self) -> Option<&Path> {
        match &self.content {
            FileContent::Spooled(file) => Some(file.path()),
            FileContent::Memory(_) => None,
        }
    }

    /// Get the file extension from the file name.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.file_name.rsplit_once('.').map(|(_, ext)| ext)
    }

    /// Reads the whole content.
    ///
    /// # Errors
    ///
    /// Returns an error if the spool file cannot be read.
    pub async fn bytes(&self) -> io::Result<Bytes> {
        match &self.content {
            FileContent::Memory(data) => Ok(data.clone()),
            FileContent::Spooled(file) => tokio::fs::read(file.path()).await.map(Bytes::from),
        }
    }

    /// Opens a blocking reader over the content.
    ///
    /// # Errors
    ///
    /// Returns an error if the spool file cannot be reopened.
    pub fn reader(&self) -> io::Result<Box<dyn Read + Send>> {
        match &self.content {
            FileContent::Memory(data) => Ok(Box::new(Cursor::new(data.clone()))),
            FileContent::Spooled(file) => Ok(Box::new(file.reopen()?)),
        }
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("name", &self.name)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .field("spooled", &self.is_spooled())
            .finish_non_exhaustive()
    }
}
