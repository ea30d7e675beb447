use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Select};
use serde::{Deserialize, Serialize};

use super::user;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub blog_title: String, // at most 100 chars
    #[sea_orm(column_type = "Text", nullable)]
    pub blog_status: Option<String>, // at most 700 chars
    pub author: Option<String>, // free-text display name
    pub rating: Option<i32>,    // 1..=10
    pub is_publish: bool,
    /// Stored filename under `images/blogs/`.
    pub cover_image: Option<String>,

    pub user_id: Option<i32>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: Option<super::user::Entity>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

/// Which of a user's blogs to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    All,
}

impl Visibility {
    /// Parse a `?visibility=` value. Anything unrecognised means `Public`.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("private") => Visibility::Private,
            Some("all") => Visibility::All,
            _ => Visibility::Public,
        }
    }
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(id).one(db).await
}

/// Published blogs in primary-key order.
pub fn select_published() -> Select<Entity> {
    Entity::find()
        .filter(Column::IsPublish.eq(true))
        .order_by_asc(Column::Id)
}

/// A user's blogs filtered by visibility, in primary-key order.
pub fn select_by_user(user_id: i32, visibility: Visibility) -> Select<Entity> {
    let select = Entity::find().filter(Column::UserId.eq(user_id));
    let select = match visibility {
        Visibility::Public => select.filter(Column::IsPublish.eq(true)),
        Visibility::Private => select.filter(Column::IsPublish.eq(false)),
        Visibility::All => select,
    };
    select.order_by_asc(Column::Id)
}

pub async fn find_all_published<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<(Model, Option<user::Model>)>, DbErr> {
    select_published()
        .find_also_related(user::Entity)
        .all(db)
        .await
}

pub async fn find_all_by_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    visibility: Visibility,
) -> Result<Vec<(Model, Option<user::Model>)>, DbErr> {
    select_by_user(user_id, visibility)
        .find_also_related(user::Entity)
        .all(db)
        .await
}
