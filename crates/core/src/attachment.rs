//! Upload checks for wiki cover attachments.
//!
//! Uploads are validated before any transaction opens; the resulting
//! [`AttachmentDescriptor`] is persisted later inside the caller's
//! transaction.

use std::io::Cursor;

use crate::error::CoreError;

/// Default upper bound for an uploaded file (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A raw uploaded file as received from the transport layer.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A checked upload, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    pub name: String,
    pub mime: String,
    pub width: i32,
    pub height: i32,
    pub data: Vec<u8>,
}

impl AttachmentDescriptor {
    /// Replace the stored display name (wiki covers take the wiki's name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Validate an upload.
///
/// Empty or oversized files fail with `InvalidParam("file")`. When
/// `require_image` is set the bytes must decode as a supported image header,
/// whose format and dimensions are recorded.
pub fn check_attachment(
    upload: AttachmentUpload,
    require_image: bool,
    max_bytes: usize,
) -> Result<AttachmentDescriptor, CoreError> {
    if upload.data.is_empty() || upload.data.len() > max_bytes {
        return Err(CoreError::invalid_param("file"));
    }

    if !require_image {
        return Ok(AttachmentDescriptor {
            name: upload.file_name,
            mime: upload
                .content_type
                .unwrap_or_else(|| "application/octet-stream".into()),
            width: 0,
            height: 0,
            data: upload.data,
        });
    }

    let reader = image::ImageReader::new(Cursor::new(upload.data.as_slice()))
        .with_guessed_format()
        .map_err(|_| CoreError::invalid_param("file"))?;
    let format = reader.format().ok_or_else(|| CoreError::invalid_param("file"))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|_| CoreError::invalid_param("file"))?;

    Ok(AttachmentDescriptor {
        name: upload.file_name,
        mime: format.to_mime_type().to_string(),
        width: i32::try_from(width).map_err(|_| CoreError::invalid_param("file"))?,
        height: i32::try_from(height).map_err(|_| CoreError::invalid_param("file"))?,
        data: upload.data,
    })
}
