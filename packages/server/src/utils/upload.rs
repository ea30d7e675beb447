use axum::extract::{DefaultBodyLimit, Multipart};

use crate::error::AppError;

/// Extensions accepted for cover and avatar uploads.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpe", "jpeg", "png", "gif", "svg", "bmp"];

/// Multipart overhead allowed on top of the configured image size.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn image_upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_upload_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(MULTIPART_OVERHEAD))
}

/// Why an uploaded filename was refused.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators, `..`, NUL or control characters.
    Unsafe,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Extension missing or outside [`IMAGE_EXTENSIONS`].
    NotAnImage,
}

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty | Self::Unsafe | Self::Hidden => "Not a valid image",
            Self::NotAnImage => "File type not allowed",
        }
    }
}

/// Validate an uploaded image filename and return its lowercase extension.
pub fn image_extension(filename: &str) -> Result<String, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    // Control characters would end up in logs and headers.
    if trimmed.chars().any(|c| c.is_control())
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed == ".."
    {
        return Err(FilenameError::Unsafe);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    let ext = match trimmed.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return Err(FilenameError::NotAnImage),
    };

    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(FilenameError::NotAnImage);
    }

    // The extension decides the stored name; make sure it maps to an image type.
    let is_image = mime_guess::from_ext(&ext)
        .first()
        .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE);
    if !is_image {
        return Err(FilenameError::NotAnImage);
    }

    Ok(ext)
}

/// An image file read from a multipart body.
pub struct UploadedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Read the multipart field `field_name` and validate it as an image.
///
/// Other fields are skipped. A missing field, or one without a filename, is
/// reported as "Not a valid image"; a disallowed extension as "File type not
/// allowed". The type check happens before the body is buffered.
pub async fn read_image_field(
    multipart: &mut Multipart,
    field_name: &str,
    max_size: u64,
) -> Result<UploadedImage, AppError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Validation(FilenameError::Empty.message().into()))?;
        let extension =
            image_extension(&filename).map_err(|e| AppError::Validation(e.message().into()))?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            if (bytes.len() + chunk.len()) as u64 > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(AppError::Validation(FilenameError::Empty.message().into()));
        }

        return Ok(UploadedImage { extension, bytes });
    }

    Err(AppError::Validation(FilenameError::Empty.message().into()))
}
