use std::fmt;

/// Errors that can occur during image storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The folder or filename would escape the storage root.
    InvalidName(String),
    /// The image exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidName(name) => write!(f, "invalid storage name: {name}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "image exceeds size limit ({actual} > {limit} bytes)")
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
