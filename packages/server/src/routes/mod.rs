use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{blog, comment, token, user};
use crate::state::AppState;
use crate::utils::upload::image_upload_body_limit;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(token_routes())
        .merge(user_routes())
        .merge(blog_routes())
        .merge(comment_routes())
        .merge(upload_routes(config.storage.max_upload_size))
}

fn token_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(token::login))
        .routes(routes!(token::refresh))
        .routes(routes!(token::revoke))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::register))
        .routes(routes!(user::me))
        .routes(routes!(user::get_user))
        .routes(routes!(user::list_user_blogs))
        .routes(routes!(user::activate))
}

fn blog_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(blog::list_blogs, blog::create_blog))
        .routes(routes!(blog::get_blog, blog::update_blog, blog::delete_blog))
        .routes(routes!(blog::publish_blog, blog::unpublish_blog))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(comment::list_comments, comment::create_comment))
        .routes(routes!(
            comment::get_comment,
            comment::update_comment,
            comment::delete_comment
        ))
        .routes(routes!(comment::publish_comment, comment::unpublish_comment))
}

/// Image uploads get a body limit sized to `storage.max_upload_size`.
fn upload_routes(max_upload_size: u64) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(blog::upload_cover))
        .routes(routes!(user::upload_avatar))
        .layer(image_upload_body_limit(max_upload_size))
}
