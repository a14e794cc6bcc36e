use serde_json::json;

use crate::common::{JPEG_BYTES, MEDIA_HOST, MultipartBody, PNG_BYTES, TestApp, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_stores_object_and_creates_image() {
        let app = TestApp::spawn().await;
        let token = app.create_user("editor").await;

        let res = app
            .upload_with_token(
                routes::IMAGE_UPLOAD,
                MultipartBody::new()
                    .file("Beach Sunset.JPG", JPEG_BYTES, "image/jpeg")
                    .text("description", "Golden hour")
                    .text("alt_text", "Sun over the sea")
                    .text("order", 4),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let data = res.data();
        assert_eq!(data["filename"], "beach-sunset.jpg");
        assert_eq!(data["order"], 4);
        assert_eq!(data["description"], "Golden hour");
        assert_eq!(data["is_deleted"], false);

        let url = data["image_url"].as_str().unwrap();
        assert!(url.starts_with(MEDIA_HOST), "{url}");
        assert!(url.ends_with("_Beach_Sunset.JPG"), "{url}");
        assert_eq!(data["backup_image_url"], data["image_url"]);
        assert!(data["file_id"].is_number());

        let blob = url.trim_start_matches(MEDIA_HOST).trim_start_matches('/');
        let (bytes, content_type) = app.store().object(blob).await.unwrap();
        assert_eq!(bytes, JPEG_BYTES);
        assert_eq!(content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn non_image_content_is_rejected_without_touching_storage() {
        let app = TestApp::spawn().await;
        let token = app.create_user("editor").await;

        let res = app
            .upload_with_token(
                routes::IMAGE_UPLOAD,
                MultipartBody::new().file("photo.png", b"%PDF-1.7 not an image", "image/png"),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "UNSUPPORTED_FILE_TYPE");
        assert_eq!(app.store().call_count(), 0);
    }

    #[tokio::test]
    async fn missing_file_part_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_user("editor").await;

        let res = app
            .upload_with_token(
                routes::IMAGE_UPLOAD,
                MultipartBody::new().text("description", "no file"),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "FILE_REQUIRED");
    }

    #[tokio::test]
    async fn upload_without_storage_is_unavailable() {
        let app = TestApp::spawn_without_storage().await;
        let token = app.create_user("editor").await;

        let res = app
            .upload_with_token(
                routes::IMAGE_UPLOAD,
                MultipartBody::new().file("a.png", PNG_BYTES, "image/png"),
                &token,
            )
            .await;

        assert_eq!(res.status, 503);
        assert_eq!(res.error_code(), "STORAGE_UNAVAILABLE");
    }
}

mod metadata {
    use super::*;

    #[tokio::test]
    async fn legacy_host_is_rewritten_into_premier_url() {
        let app = TestApp::spawn().await;
        let token = app.create_user("editor").await;

        let res = app
            .post_with_token(
                routes::IMAGES,
                &json!({
                    "filename": "Colosseum At Dusk.jpg",
                    "image_url": "https://storage.googleapis.com/staging-luxe.appspot.com/rome/colosseum.jpg",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.data()["filename"], "colosseum-at-dusk.jpg");
        assert_eq!(
            res.data()["premier_image_url"],
            "https://example.com/images/rome/colosseum.jpg"
        );
        assert_eq!(res.data()["order"], 0);

        let id = res.id();
        let res = app
            .patch_with_token(
                &routes::image(id),
                &json!({"image_url": "https://lh3.googleusercontent.com/abc"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(
            res.data()["premier_image_url"],
            "https://example.com/images/abc"
        );
    }

    #[tokio::test]
    async fn unknown_file_reference_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_user("editor").await;

        let res = app
            .post_with_token(
                routes::IMAGES,
                &json!({"filename": "x.png", "image_url": "https://cdn.test/x.png", "file_id": 31337}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "FILE_NOT_FOUND");
    }

    #[tokio::test]
    async fn description_too_long_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_user("editor").await;

        let res = app
            .post_with_token(
                routes::IMAGES,
                &json!({
                    "filename": "x.png",
                    "image_url": "https://cdn.test/x.png",
                    "description": "d".repeat(1001),
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "VALIDATION_ERROR");
    }
}

mod soft_delete {
    use super::*;

    async fn create(app: &TestApp, token: &str, name: &str, order: i32) -> i32 {
        let res = app
            .post_with_token(
                routes::IMAGES,
                &json!({"filename": name, "image_url": format!("https://cdn.test/{name}"), "order": order}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        res.id()
    }

    #[tokio::test]
    async fn deleted_image_stays_retrievable_but_leaves_active_listing() {
        let app = TestApp::spawn().await;
        let token = app.create_user("editor").await;
        let keep = create(&app, &token, "keep.png", 1).await;
        let gone = create(&app, &token, "gone.png", 0).await;

        let res = app.delete_with_token(&routes::image(gone), &token).await;
        assert_eq!(res.status, 204);

        let fetched = app.get_without_token(&routes::image(gone)).await;
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.data()["is_deleted"], true);
        assert!(fetched.data()["deleted_at"].is_string());

        let active = app.get_without_token(routes::IMAGES).await;
        assert_eq!(active.body["total"], 1);
        assert_eq!(active.data()[0]["id"], keep);

        let all = app
            .get_without_token(&format!("{}?active_only=false", routes::IMAGES))
            .await;
        assert_eq!(all.body["total"], 2);
        // order ascending: the deleted image (order 0) comes first
        assert_eq!(all.data()[0]["id"], gone);
    }

    #[tokio::test]
    async fn deleting_twice_keeps_the_first_timestamp() {
        let app = TestApp::spawn().await;
        let token = app.create_user("editor").await;
        let id = create(&app, &token, "twice.png", 0).await;

        assert_eq!(app.delete_with_token(&routes::image(id), &token).await.status, 204);
        let first = app.get_without_token(&routes::image(id)).await;

        assert_eq!(app.delete_with_token(&routes::image(id), &token).await.status, 204);
        let second = app.get_without_token(&routes::image(id)).await;

        assert_eq!(first.data()["deleted_at"], second.data()["deleted_at"]);
    }

    #[tokio::test]
    async fn deleting_requires_a_token() {
        let app = TestApp::spawn().await;
        let token = app.create_user("editor").await;
        let id = create(&app, &token, "guarded.png", 0).await;

        let res = app.delete_without_token(&routes::image(id)).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.error_code(), "TOKEN_MISSING");
    }
}
