use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use server::entity::file;

use crate::common::{MEDIA_HOST, MultipartBody, PNG_BYTES, TestApp, routes};

#[tokio::test]
async fn upload_records_file_metadata() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;

    let res = app
        .upload_with_token(
            routes::STORAGE_UPLOAD,
            // Declared type and extension are both wrong; the content decides.
            MultipartBody::new().file("../../etc/My Map.gif", PNG_BYTES, "text/plain"),
            &token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    let data = res.data();
    assert_eq!(data["content_type"], "image/png");
    assert_eq!(data["size"], PNG_BYTES.len());
    assert_eq!(data["provider"], "memory");
    assert_eq!(data["is_deleted"], false);

    let filename = data["filename"].as_str().unwrap();
    assert!(!filename.contains('/'), "{filename}");
    assert!(filename.ends_with("My_Map.gif"), "{filename}");

    let blob = data["blob_name"].as_str().unwrap();
    let (hex, rest) = blob.split_once('_').unwrap();
    assert_eq!(hex.len(), 32);
    assert_eq!(rest, filename);
    assert_eq!(data["public_url"], format!("{MEDIA_HOST}/{blob}"));
    assert!(app.store().object(blob).await.is_some());
}

#[tokio::test]
async fn upload_requires_a_token() {
    let app = TestApp::spawn().await;

    let res = app
        .upload_with_token(
            routes::STORAGE_UPLOAD,
            MultipartBody::new().file("a.png", PNG_BYTES, "image/png"),
            "bogus",
        )
        .await;

    assert_eq!(res.status, 401);
    assert_eq!(app.store().call_count(), 0);
}

#[tokio::test]
async fn empty_file_is_not_an_image() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;

    let res = app
        .upload_with_token(
            routes::STORAGE_UPLOAD,
            MultipartBody::new().file("empty.png", b"", "image/png"),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "UNSUPPORTED_FILE_TYPE");
    assert_eq!(app.store().call_count(), 0);
}

#[tokio::test]
async fn signed_url_honours_expiry_bounds() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    let id = app.upload_png(&token, "map.png").await;

    let default = app.get_with_token(&routes::signed_url(id), &token).await;
    assert_eq!(default.status, 200, "{}", default.text);
    assert_eq!(default.data()["expires_in"], 3600);
    assert!(
        default.data()["url"]
            .as_str()
            .unwrap()
            .ends_with("expires_in=3600")
    );

    let custom = app
        .get_with_token(&format!("{}?expires_in=60", routes::signed_url(id)), &token)
        .await;
    assert_eq!(custom.data()["expires_in"], 60);

    for bad in ["0", "604801"] {
        let res = app
            .get_with_token(
                &format!("{}?expires_in={bad}", routes::signed_url(id)),
                &token,
            )
            .await;
        assert_eq!(res.status, 400, "expires_in={bad}");
        assert_eq!(res.error_code(), "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn soft_deleted_file_is_hidden_and_cannot_be_signed() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    let keep = app.upload_png(&token, "keep.png").await;
    let gone = app.upload_png(&token, "gone.png").await;

    assert_eq!(app.delete_with_token(&routes::file(gone), &token).await.status, 204);

    let listed = app.get_with_token(routes::STORAGE_FILES, &token).await;
    assert_eq!(listed.status, 200);
    assert_eq!(listed.body["total"], 1);
    assert_eq!(listed.data()[0]["id"], keep);

    let everything = app
        .get_with_token(
            &format!("{}?include_deleted=true", routes::STORAGE_FILES),
            &token,
        )
        .await;
    assert_eq!(everything.body["total"], 2);
    // newest first
    assert_eq!(everything.data()[0]["id"], gone);

    let meta = app.get_with_token(&routes::file(gone), &token).await;
    assert_eq!(meta.status, 200);
    assert_eq!(meta.data()["is_deleted"], true);

    let signed = app.get_with_token(&routes::signed_url(gone), &token).await;
    assert_eq!(signed.status, 404);

    // The object itself stays in the bucket.
    let blob = meta.data()["blob_name"].as_str().unwrap();
    assert!(app.store().object(blob).await.is_some());
}

#[tokio::test]
async fn signed_url_for_other_provider_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    let id = app.upload_png(&token, "old.png").await;

    let row = file::Entity::find_by_id(id).one(&app.db).await.unwrap().unwrap();
    let mut row: file::ActiveModel = row.into();
    row.provider = Set("aws".into());
    row.update(&app.db).await.unwrap();

    let res = app.get_with_token(&routes::signed_url(id), &token).await;
    assert_eq!(res.status, 404, "{}", res.text);
    assert_eq!(res.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn bucket_listing_is_admin_only() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("root").await;
    let editor = app.create_user("editor").await;
    app.upload_png(&editor, "one.png").await;
    app.upload_png(&editor, "two.png").await;

    let denied = app.get_with_token(routes::STORAGE_OBJECTS, &editor).await;
    assert_eq!(denied.status, 403);

    let listed = app.get_with_token(routes::STORAGE_OBJECTS, &admin).await;
    assert_eq!(listed.status, 200, "{}", listed.text);
    assert_eq!(listed.data().as_array().unwrap().len(), 2);

    let filtered = app
        .get_with_token(&format!("{}?prefix=zzz", routes::STORAGE_OBJECTS), &admin)
        .await;
    assert!(filtered.data().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn storage_endpoints_without_provider_are_unavailable() {
    let app = TestApp::spawn_without_storage().await;
    let token = app.create_user("editor").await;

    let res = app
        .get_with_token(routes::STORAGE_OBJECTS, &app.create_admin("root").await)
        .await;
    assert_eq!(res.status, 503);
    assert_eq!(res.error_code(), "STORAGE_UNAVAILABLE");

    let upload = app
        .upload_with_token(
            routes::STORAGE_UPLOAD,
            MultipartBody::new().file("a.png", PNG_BYTES, "image/png"),
            &token,
        )
        .await;
    assert_eq!(upload.status, 503);
}
