use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use blog_server::entity::{blog, comment};

use crate::common::{PNG_BYTES, TestApp, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn created_blog_is_owned_by_caller_and_unpublished() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                routes::BLOGS,
                &json!({
                    "blog_title": "Morning walk",
                    "blog_status": "Up the hill",
                    "rating": 8,
                    "author": "Alice",
                }),
                &alice,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["blog_title"], "Morning walk");
        assert_eq!(res.body["blog_status"], "Up the hill");
        assert_eq!(res.body["rating"], 8);
        assert_eq!(res.body["author"], "Alice");
        assert_eq!(res.body["is_publish"], false);
        assert_eq!(res.body["user"]["username"], "alice");
        assert!(res.body["user"].get("email").is_none());
        assert!(res.body["user"].get("is_active").is_none());
        assert!(res.body["user"]["avatar_url"].is_string());
        assert!(res.body["created_at"].is_string());
        assert!(
            res.body["cover_url"]
                .as_str()
                .unwrap()
                .ends_with("/static/images/assets/default-blog-cover.jpg")
        );
    }

    #[tokio::test]
    async fn client_supplied_output_fields_are_ignored() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                routes::BLOGS,
                &json!({"blog_title": "T", "id": 999, "is_publish": true}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 201);
        assert_ne!(res.body["id"], 999);
        assert_eq!(res.body["is_publish"], false);
    }

    #[tokio::test]
    async fn title_longer_than_100_characters_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(routes::BLOGS, &json!({"blog_title": "A".repeat(101)}), &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["errors"]["blog_title"].is_array());

        let count = blog::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn missing_title_and_bad_rating_are_reported_together() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(routes::BLOGS, &json!({"rating": 11}), &alice)
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["errors"]["blog_title"].is_array());
        assert!(res.body["errors"]["rating"].is_array());
    }

    #[tokio::test]
    async fn wrong_types_are_reported_with_other_field_errors() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                routes::BLOGS,
                &json!({"blog_title": "A".repeat(101), "rating": "high"}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(
            res.body["errors"]["blog_title"][0],
            "Longer than maximum length 100."
        );
        assert_eq!(res.body["errors"]["rating"][0], "Not a valid integer.");
    }

    #[tokio::test]
    async fn body_that_is_not_an_object_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(routes::BLOGS, &json!("Morning walk"), &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body.get("errors").is_none());
    }

    #[tokio::test]
    async fn anonymous_caller_cannot_create() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::BLOGS, &json!({"blog_title": "T"}))
            .await;

        assert_eq!(res.status, 401);
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn list_contains_only_published_blogs_in_creation_order() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let first = app.create_published_blog(&alice, "First").await;
        app.create_blog(&alice, "Draft").await;
        let third = app.create_published_blog(&alice, "Third").await;

        let res = app.get_without_token(routes::BLOGS).await;

        assert_eq!(res.status, 200);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["id"], first);
        assert_eq!(data[1]["id"], third);
        assert!(data.iter().all(|b| b["is_publish"] == true));
    }

    #[tokio::test]
    async fn empty_list_is_wrapped_in_data() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::BLOGS).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, json!({"data": []}));
    }

    #[tokio::test]
    async fn missing_blog_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::blog(999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn published_blog_is_visible_to_anyone() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_published_blog(&alice, "Hello").await;

        let res = app.get_without_token(&routes::blog(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["blog_title"], "Hello");
    }

    #[tokio::test]
    async fn unpublished_blog_is_visible_only_to_its_owner() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_blog(&alice, "Draft").await;

        let anonymous = app.get_without_token(&routes::blog(id)).await;
        assert_eq!(anonymous.status, 403);
        assert_eq!(anonymous.body["code"], "PERMISSION_DENIED");

        let other = app.get_with_token(&routes::blog(id), &bob).await;
        assert_eq!(other.status, 403);

        let owner = app.get_with_token(&routes::blog(id), &alice).await;
        assert_eq!(owner.status, 200);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn owner_can_update_individual_fields() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_blog(&alice, "Old").await;

        let res = app
            .patch_with_token(&routes::blog(id), &json!({"blog_title": "New"}), &alice)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["blog_title"], "New");
        assert_eq!(res.body["blog_status"], "Feeling good");
        assert_eq!(res.body["rating"], 7);
    }

    #[tokio::test]
    async fn empty_strings_do_not_overwrite() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_blog(&alice, "Keep me").await;

        let res = app
            .patch_with_token(
                &routes::blog(id),
                &json!({"blog_title": "", "blog_status": "", "author": ""}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["blog_title"], "Keep me");
        assert_eq!(res.body["blog_status"], "Feeling good");
        assert_eq!(res.body["author"], "Tester");
    }

    #[tokio::test]
    async fn zero_rating_never_replaces_the_stored_rating() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_blog(&alice, "Rated").await;

        let res = app
            .patch_with_token(&routes::blog(id), &json!({"rating": 0}), &alice)
            .await;
        assert_eq!(res.status, 400);

        let stored = app.get_with_token(&routes::blog(id), &alice).await;
        assert_eq!(stored.body["rating"], 7);
    }

    #[tokio::test]
    async fn mistyped_field_leaves_the_blog_unchanged() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_blog(&alice, "Stable").await;

        let res = app
            .patch_with_token(
                &routes::blog(id),
                &json!({"blog_title": "Changed", "rating": [7]}),
                &alice,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["errors"]["rating"][0], "Not a valid integer.");

        let stored = app.get_with_token(&routes::blog(id), &alice).await;
        assert_eq!(stored.body["blog_title"], "Stable");
    }

    #[tokio::test]
    async fn non_owner_cannot_update() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_published_blog(&alice, "Mine").await;

        let res = app
            .patch_with_token(&routes::blog(id), &json!({"blog_title": "Hijacked"}), &bob)
            .await;

        assert_eq!(res.status, 403);
        let stored = app.get_without_token(&routes::blog(id)).await;
        assert_eq!(stored.body["blog_title"], "Mine");
    }

    #[tokio::test]
    async fn update_of_missing_blog_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .patch_with_token(&routes::blog(999), &json!({"blog_title": "X"}), &alice)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn owner_can_delete_and_comments_go_with_it() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_published_blog(&alice, "Doomed").await;
        app.create_comment(id, &alice, "first!").await;

        let res = app.delete_with_token(&routes::blog(id), &alice).await;
        assert_eq!(res.status, 204);
        assert!(res.text.is_empty());

        let gone = app.get_with_token(&routes::blog(id), &alice).await;
        assert_eq!(gone.status, 404);

        let orphans = comment::Entity::find()
            .filter(comment::Column::BlogId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn non_owner_cannot_delete() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_published_blog(&alice, "Mine").await;

        let res = app.delete_with_token(&routes::blog(id), &bob).await;

        assert_eq!(res.status, 403);
        assert_eq!(app.get_without_token(&routes::blog(id)).await.status, 200);
    }
}

mod publish {
    use super::*;

    #[tokio::test]
    async fn publishing_twice_is_the_same_as_once() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_blog(&alice, "Post").await;

        let first = app.put_with_token(&routes::blog_publish(id), &alice).await;
        let second = app.put_with_token(&routes::blog_publish(id), &alice).await;
        assert_eq!(first.status, 204);
        assert_eq!(second.status, 204);

        let res = app.get_without_token(&routes::blog(id)).await;
        assert_eq!(res.body["is_publish"], true);
        let list = app.get_without_token(routes::BLOGS).await;
        assert_eq!(list.body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unpublish_hides_the_blog_again() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_published_blog(&alice, "Post").await;

        let res = app.delete_with_token(&routes::blog_publish(id), &alice).await;
        assert_eq!(res.status, 204);

        let list = app.get_without_token(routes::BLOGS).await;
        assert!(list.body["data"].as_array().unwrap().is_empty());
        assert_eq!(app.get_without_token(&routes::blog(id)).await.status, 403);
    }

    #[tokio::test]
    async fn non_owner_cannot_unpublish() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_published_blog(&alice, "Post").await;

        let res = app.delete_with_token(&routes::blog_publish(id), &bob).await;
        assert_eq!(res.status, 403);

        let stored = app.get_without_token(&routes::blog(id)).await;
        assert_eq!(stored.status, 200);
        assert_eq!(stored.body["is_publish"], true);
    }

    #[tokio::test]
    async fn publishing_a_missing_blog_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app.put_with_token(&routes::blog_publish(999), &alice).await;

        assert_eq!(res.status, 404);
    }
}

mod cover {
    use super::*;

    #[tokio::test]
    async fn owner_can_upload_a_cover() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_blog(&alice, "Pretty").await;

        let res = app
            .upload_with_token(&routes::blog_cover(id), "cover", "sky.PNG", PNG_BYTES.to_vec(), &alice)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let url = res.body["cover_url"].as_str().unwrap();
        assert!(url.contains("/static/images/blogs/"));
        assert!(url.ends_with(".png"));
        assert_eq!(res.body.as_object().unwrap().len(), 1);

        let stored = app.get_with_token(&routes::blog(id), &alice).await;
        assert_eq!(stored.body["cover_url"], url);
    }

    #[tokio::test]
    async fn replacing_a_cover_deletes_the_old_file() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_blog(&alice, "Pretty").await;

        let first = app
            .upload_with_token(&routes::blog_cover(id), "cover", "a.jpg", PNG_BYTES.to_vec(), &alice)
            .await;
        let first_name = first.body["cover_url"]
            .as_str()
            .unwrap()
            .rsplit('/')
            .next()
            .unwrap()
            .to_string();
        let first_path = app.static_dir.join("images/blogs").join(first_name);
        assert!(first_path.exists());

        let second = app
            .upload_with_token(&routes::blog_cover(id), "cover", "b.bmp", PNG_BYTES.to_vec(), &alice)
            .await;
        assert_eq!(second.status, 200);
        assert!(!first_path.exists());
    }

    #[tokio::test]
    async fn executable_is_rejected_and_cover_is_unchanged() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_blog(&alice, "Plain").await;
        let before = app.get_with_token(&routes::blog(id), &alice).await;

        let res = app
            .upload_with_token(&routes::blog_cover(id), "cover", "virus.exe", vec![0x4D, 0x5A], &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "File type not allowed");

        let after = app.get_with_token(&routes::blog(id), &alice).await;
        assert_eq!(after.body["cover_url"], before.body["cover_url"]);
        let stored = blog::Entity::find_by_id(id).one(&app.db).await.unwrap().unwrap();
        assert!(stored.cover_image.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_blog(&alice, "Plain").await;

        let res = app
            .upload_with_token(&routes::blog_cover(id), "something_else", "a.png", PNG_BYTES.to_vec(), &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Not a valid image");
    }

    #[tokio::test]
    async fn non_owner_cannot_upload_a_cover() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_published_blog(&alice, "Mine").await;

        let res = app
            .upload_with_token(&routes::blog_cover(id), "cover", "a.png", PNG_BYTES.to_vec(), &bob)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn cover_for_missing_blog_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .upload_with_token(&routes::blog_cover(999), "cover", "a.png", PNG_BYTES.to_vec(), &alice)
            .await;

        assert_eq!(res.status, 404);
    }
}
