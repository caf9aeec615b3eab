//! Project image upload validation.
//!
//! Images arrive as raw bytes with a client-supplied filename and content
//! type. Storage is the persistence layer's concern; this module only decides
//! whether an upload is acceptable.

use crate::error::CoreError;

/// Default upper bound on image size (2 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Content types accepted for project images.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/webp"];

/// Maximum stored filename length.
const MAX_FILE_NAME_LEN: usize = 255;

/// An uploaded image ready to be stored alongside a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    /// Validate raw upload parts and build an [`ImageUpload`].
    ///
    /// The filename is reduced to its final path component.
    pub fn new(
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
        max_bytes: usize,
    ) -> Result<Self, CoreError> {
        let file_name = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();
        if file_name.is_empty() {
            return Err(CoreError::Validation("Image file name is required".into()));
        }
        if file_name.len() > MAX_FILE_NAME_LEN {
            return Err(CoreError::Validation(format!(
                "Image file name exceeds {MAX_FILE_NAME_LEN} characters"
            )));
        }

        let content_type = content_type.trim().to_ascii_lowercase();
        if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(CoreError::Validation(format!(
                "Unsupported image type '{content_type}'. Must be one of: {}",
                ALLOWED_IMAGE_TYPES.join(", ")
            )));
        }

        if data.is_empty() {
            return Err(CoreError::Validation("Image file is empty".into()));
        }
        if data.len() > max_bytes {
            return Err(CoreError::Validation(format!(
                "Image is {} bytes; the limit is {max_bytes}",
                data.len()
            )));
        }

        Ok(Self {
            file_name: file_name.to_string(),
            content_type,
            data,
        })
    }
}
