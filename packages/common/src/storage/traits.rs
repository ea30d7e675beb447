use async_trait::async_trait;

use super::error::StorageError;

/// Folder-namespaced image storage.
///
/// Images live at `images/{folder}/{filename}` relative to the store root,
/// which is also the layout of the public static tree.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `data` under `folder` and return the generated filename.
    ///
    /// `extension` is appended to a random name; it is not validated here.
    async fn save(&self, folder: &str, extension: &str, data: &[u8])
    -> Result<String, StorageError>;

    /// Delete a stored image.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, folder: &str, filename: &str) -> Result<bool, StorageError>;

    /// Check whether an image exists.
    async fn exists(&self, folder: &str, filename: &str) -> Result<bool, StorageError>;
}
