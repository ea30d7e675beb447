use std::sync::Arc;

use common::storage::ImageStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::utils::revocation::RevocationList;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub images: Arc<dyn ImageStore>,
    pub revoked: Arc<RevocationList>,
}
