use chrono::{Duration, Utc};
use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_with_valid_credentials() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "Alice@Example.com",
                    "username": "Alice",
                    "password": PASSWORD,
                    "password_confirm": PASSWORD,
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], 201);
        assert_eq!(res.data()["email"], "alice@example.com");
        assert_eq!(res.data()["username"], "alice");
        assert_eq!(res.data()["is_superuser"], false);
        assert!(res.data().get("hashed_password").is_none());
        assert_eq!(res.body["resource_id"], res.data()["id"]);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let app = TestApp::spawn().await;
        app.insert_user("alice", true, false).await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "ALICE@example.com",
                    "username": "someone-else",
                    "password": PASSWORD,
                    "password_confirm": PASSWORD,
                }),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.error_code(), "EMAIL_EXISTS");
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let app = TestApp::spawn().await;
        app.insert_user("alice", true, false).await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "other@example.com",
                    "username": "alice",
                    "password": PASSWORD,
                    "password_confirm": PASSWORD,
                }),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.error_code(), "USERNAME_EXISTS");
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "bob@example.com",
                    "username": "bob",
                    "password": PASSWORD,
                    "password_confirm": "Str0ng!Pasz",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "PASSWORD_MISMATCH");
    }

    #[tokio::test]
    async fn weak_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "bob@example.com",
                    "username": "bob",
                    "password": "alllowercase1!",
                    "password_confirm": "alllowercase1!",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_by_email_or_username_returns_bearer_token() {
        let app = TestApp::spawn().await;
        app.insert_user("carol", true, false).await;

        for body in [
            json!({"email": "CAROL@example.com", "password": PASSWORD}),
            json!({"username": "carol", "password": PASSWORD}),
        ] {
            let res = app.post_without_token(routes::LOGIN, &body).await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.data()["token_type"], "bearer");
            assert_eq!(res.data()["expires_in"], 30 * 60);
            assert_eq!(res.data()["user"]["username"], "carol");
            assert!(res.data()["access_token"].as_str().is_some());
        }
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let app = TestApp::spawn().await;
        app.insert_user("carol", true, false).await;

        let wrong = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "carol", "password": "Wr0ng!Pass"}),
            )
            .await;
        let unknown = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "nobody", "password": PASSWORD}),
            )
            .await;

        assert_eq!(wrong.status, 401);
        assert_eq!(unknown.status, 401);
        assert_eq!(wrong.error_code(), "INVALID_CREDENTIALS");
        assert_eq!(unknown.error_code(), "INVALID_CREDENTIALS");
        assert_eq!(wrong.body["message"], unknown.body["message"]);
    }

    #[tokio::test]
    async fn inactive_user_cannot_log_in() {
        let app = TestApp::spawn().await;
        app.insert_user("dormant", false, false).await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "dormant", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.error_code(), "INACTIVE_USER");
    }

    #[tokio::test]
    async fn login_requires_an_identity() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::LOGIN, &json!({"password": PASSWORD}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "VALIDATION_ERROR");
    }
}

mod tokens {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_token_owner() {
        let app = TestApp::spawn().await;
        let token = app.create_user("dave").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["username"], "dave");
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.error_code(), "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.error_code(), "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.insert_user("erin", true, false).await;
        let issued =
            server::utils::jwt::sign_at(id, &app.config.auth, Utc::now() - Duration::hours(2))
                .unwrap();

        let res = app.get_with_token(routes::ME, &issued.token).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.error_code(), "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn token_for_deleted_user_is_rejected_by_me() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let id = app.insert_user("frank", true, false).await;
        let token = app.login("frank").await;

        let del = app.delete_with_token(&routes::user(id), &admin).await;
        assert_eq!(del.status, 204);

        let res = app.get_with_token(routes::ME, &token).await;
        assert_eq!(res.status, 401);
    }
}
