//! Multipart form data reading for file uploads.
//!
//! [`MultipartForm::read`] consumes a `multipart/form-data` body and splits
//! it into text values and uploaded files, each keyed by form field name.
//!
//! Memory use is bounded by [`BindConfig`]: file content is kept in memory
//! until the `max_memory` budget is exhausted, after which each further file
//! is spooled to a temporary file. Text parts share the same budget plus
//! `max_value_overflow`; they are never spooled, so exceeding that ceiling
//! fails the request.

use bytes::BytesMut;
use tokio::io::AsyncWriteExt;

use crate::config::BindConfig;
use crate::dispatch::ContentKind;
use crate::error::BindError;
use crate::fields::WireValues;
use crate::file::FileHandle;
use crate::request::RequestBody;

/// The parsed content of a multipart body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    /// Text parts, by field name.
    pub values: WireValues<String>,
    /// File parts (parts with a non-empty file name), by field name.
    pub files: WireValues<FileHandle>,
}

impl MultipartForm {
    /// Reads every part of `body`, delimited by `boundary`.
    ///
    /// Parts without a name are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The multipart data is malformed or a text part is not UTF-8
    /// - Text parts exceed the configured ceiling
    /// - A spool file cannot be created or written
    pub async fn read(
        body: RequestBody,
        boundary: &str,
        config: &BindConfig,
    ) -> Result<Self, BindError> {
        let mut multipart = multer::Multipart::new(body.into_stream(), boundary);
        let mut form = Self::default();

        let mut file_budget = config.max_memory;
        let mut value_budget = config.max_memory.saturating_add(config.max_value_overflow);

        while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            let Some(file_name) = field
                .file_name()
                .filter(|n| !n.is_empty())
                .map(str::to_owned)
            else {
                let mut buf = BytesMut::new();
                while let Some(chunk) = field.chunk().await.map_err(malformed)? {
                    if buf.len() + chunk.len() > value_budget {
                        return Err(BindError::PayloadTooLarge {
                            limit: config.max_memory.saturating_add(config.max_value_overflow),
                        });
                    }
                    buf.extend_from_slice(&chunk);
                }
                value_budget -= buf.len();

                let text = String::from_utf8(buf.to_vec()).map_err(|e| {
                    BindError::malformed(
                        ContentKind::Multipart,
                        format!("field '{name}' is not valid UTF-8: {e}"),
                    )
                })?;
                form.values.append(name, text);
                continue;
            };

            let content_type = field.content_type().cloned();
            let headers = field.headers().clone();

            let mut buf = BytesMut::new();
            let mut size: u64 = 0;
            let mut spool: Option<(tempfile::NamedTempFile, tokio::fs::File)> = None;

            while let Some(chunk) = field.chunk().await.map_err(malformed)? {
                size += chunk.len() as u64;

                if let Some((_, file)) = spool.as_mut() {
                    file.write_all(&chunk).await?;
                    continue;
                }

                if buf.len() + chunk.len() > file_budget {
                    let named = create_spool_file(config)?;
                    let mut file = tokio::fs::File::from_std(named.reopen()?);
                    file.write_all(&buf).await?;
                    file.write_all(&chunk).await?;
                    buf.clear();
                    spool = Some((named, file));
                } else {
                    buf.extend_from_slice(&chunk);
                }
            }

            let handle = match spool {
                Some((named, mut file)) => {
                    file.flush().await?;
                    tracing::debug!(
                        field = %name,
                        file_name = %file_name,
                        size,
                        path = %named.path().display(),
                        "spooled multipart file to disk"
                    );
                    FileHandle::spooled(name.clone(), file_name, content_type, headers, size, named)
                }
                None => {
                    file_budget -= buf.len();
                    value_budget = value_budget.saturating_sub(buf.len());
                    FileHandle::in_memory(name.clone(), file_name, content_type, buf.freeze())
                        .with_headers(headers)
                }
            };

            form.files.append(name, handle);
        }

        Ok(form)
    }
}

fn create_spool_file(config: &BindConfig) -> std::io::Result<tempfile::NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("archimedes-upload-");
    match &config.temp_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
}

fn malformed(err: multer::Error) -> BindError {
    BindError::malformed(ContentKind::Multipart, err)
}
