use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub content: String, // at most 1000 chars
    pub author: Option<String>, // nickname, at most 100 chars
    pub is_publish: bool,

    pub blog_id: i32,
    #[sea_orm(belongs_to, from = "blog_id", to = "id")]
    pub blog: HasOne<super::blog::Entity>,

    pub user_id: Option<i32>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: Option<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

/// Look up a comment by id, only if it belongs to `blog_id`.
pub async fn find_by_id_for_blog<C: ConnectionTrait>(
    db: &C,
    blog_id: i32,
    id: i32,
) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(id)
        .filter(Column::BlogId.eq(blog_id))
        .one(db)
        .await
}

/// Published comments of a blog in primary-key order.
pub async fn find_all_published_for_blog<C: ConnectionTrait>(
    db: &C,
    blog_id: i32,
) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .filter(Column::BlogId.eq(blog_id))
        .filter(Column::IsPublish.eq(true))
        .order_by_asc(Column::Id)
        .all(db)
        .await
}
