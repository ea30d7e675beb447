use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::entity::{blog, comment};

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("blog_server::entity::*")
        .sync(&db)
        .await?;
    ensure_indexes(&db).await?;

    Ok(db)
}

/// Ensure the secondary indexes behind the listing queries exist.
///
/// Schema sync only creates the tables, so composite non-unique indexes are
/// added here. Failures are logged and skipped; the queries work without them.
pub async fn ensure_indexes<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    // Per-user listing: WHERE user_id = ? AND is_publish = ?
    let blog_index = Index::create()
        .if_not_exists()
        .name("idx_blog_user_publish")
        .table(blog::Entity)
        .col(blog::Column::UserId)
        .col(blog::Column::IsPublish)
        .to_owned();

    // Per-blog comment listing: WHERE blog_id = ? AND is_publish = true
    let comment_index = Index::create()
        .if_not_exists()
        .name("idx_comment_blog_publish")
        .table(comment::Entity)
        .col(comment::Column::BlogId)
        .col(comment::Column::IsPublish)
        .to_owned();

    for (name, stmt) in [
        ("idx_blog_user_publish", blog_index),
        ("idx_comment_blog_publish", comment_index),
    ] {
        match db.execute(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
