use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn active_user_receives_access_and_refresh_tokens() {
        let app = TestApp::spawn().await;
        app.register("alice").await;
        app.activate("alice@example.com").await;

        let res = app.login("alice@example.com", PASSWORD).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["access_token"].is_string());
        assert!(res.body["refresh_token"].is_string());
    }

    #[tokio::test]
    async fn email_is_matched_case_insensitively() {
        let app = TestApp::spawn().await;
        app.register("alice").await;
        app.activate("alice@example.com").await;

        let res = app.login("  Alice@Example.COM ", PASSWORD).await;

        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.register("alice").await;
        app.activate("alice@example.com").await;

        let res = app.login("alice@example.com", "wrongpassword").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_gets_the_same_error_as_a_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app.login("nobody@example.com", PASSWORD).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn inactive_account_cannot_log_in() {
        let app = TestApp::spawn().await;
        app.register("alice").await;

        let res = app.login("alice@example.com", PASSWORD).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "ACCOUNT_INACTIVE");
    }

    #[tokio::test]
    async fn missing_fields_are_reported_per_field() {
        let app = TestApp::spawn().await;

        let res = app.post_without_token(routes::TOKEN, &json!({})).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["errors"]["email"].is_array());
        assert!(res.body["errors"]["password"].is_array());
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(app.url(routes::TOKEN))
            .header("Content-Type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

mod bearer_tokens {
    use super::*;

    #[tokio::test]
    async fn protected_endpoint_without_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .client
            .get(app.url(routes::ME))
            .header("Authorization", format!("Token {token}"))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn refresh_token_is_not_accepted_as_an_access_token() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice").await;
        let login = app.login("alice@example.com", PASSWORD).await;
        let refresh = login.body["refresh_token"].as_str().unwrap();

        let res = app.get_with_token(routes::ME, refresh).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod refresh {
    use super::*;

    #[tokio::test]
    async fn refresh_token_yields_a_working_access_token() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice").await;
        let login = app.login("alice@example.com", PASSWORD).await;
        let refresh = login.body["refresh_token"].as_str().unwrap();

        let res = app.post_empty_with_token(routes::REFRESH, refresh).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let access = res.body["access_token"].as_str().unwrap();

        let me = app.get_with_token(routes::ME, access).await;
        assert_eq!(me.status, 200);
        assert_eq!(me.body["username"], "alice");
    }

    #[tokio::test]
    async fn access_token_cannot_be_used_to_refresh() {
        let app = TestApp::spawn().await;
        let access = app.create_authenticated_user("alice").await;

        let res = app.post_empty_with_token(routes::REFRESH, &access).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod revoke {
    use super::*;

    #[tokio::test]
    async fn revoked_token_is_rejected_afterwards() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app.post_empty_with_token(routes::REVOKE, &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Successfully logged out");

        let me = app.get_with_token(routes::ME, &token).await;
        assert_eq!(me.status, 401);
        assert_eq!(me.body["code"], "TOKEN_REVOKED");
    }

    #[tokio::test]
    async fn revoking_one_token_leaves_other_sessions_alone() {
        let app = TestApp::spawn().await;
        let first = app.create_authenticated_user("alice").await;
        let second = app.login("alice@example.com", PASSWORD).await;
        let second = second.body["access_token"].as_str().unwrap();

        app.post_empty_with_token(routes::REVOKE, &first).await;

        let me = app.get_with_token(routes::ME, second).await;
        assert_eq!(me.status, 200);
    }

    #[tokio::test]
    async fn revoked_token_is_rejected_on_optional_auth_endpoints_too() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        app.post_empty_with_token(routes::REVOKE, &token).await;

        let res = app.get_with_token(routes::BLOGS, &token).await;
        assert_eq!(res.status, 200, "public list ignores the header");

        let res = app.get_with_token(&routes::user("alice"), &token).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_REVOKED");
    }
}
