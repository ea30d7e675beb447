use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::ImageStore;

/// Filesystem-backed image store.
///
/// Images are written to `{base_path}/images/{folder}/{uuid}.{ext}`. Writes go
/// through a temp file in `{base_path}/.tmp` and are renamed into place, so a
/// half-written image is never visible under its final name.
pub struct FilesystemImageStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemImageStore {
    /// Create a new filesystem image store rooted at `base_path`.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(base_path.join("images")).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Absolute path of an image on disk.
    pub fn image_path(&self, folder: &str, filename: &str) -> Result<PathBuf, StorageError> {
        check_component(folder)?;
        check_component(filename)?;
        Ok(self.base_path.join("images").join(folder).join(filename))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

/// Reject names that are empty or could walk out of the storage root.
fn check_component(name: &str) -> Result<(), StorageError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
    async fn save(
        &self,
        folder: &str,
        extension: &str,
        data: &[u8],
    ) -> Result<String, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let filename = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        let image_path = self.image_path(folder, &filename)?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = image_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &image_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(folder, filename = %filename, size = data.len(), "Stored image");
        Ok(filename)
    }

    async fn delete(&self, folder: &str, filename: &str) -> Result<bool, StorageError> {
        let image_path = self.image_path(folder, filename)?;
        match fs::remove_file(&image_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, folder: &str, filename: &str) -> Result<bool, StorageError> {
        let image_path = self.image_path(folder, filename)?;
        Ok(fs::try_exists(&image_path).await?)
    }
}
