use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn create_derives_slug_and_uppercases_code() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;

    let res = app
        .post_with_token(
            routes::COUNTRIES,
            &json!({
                "name": "  São Tomé and Príncipe ",
                "country_code": "st",
                "location": "0.19, 6.61",
                "showon_destmenu": true,
            }),
            &token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.data()["slug"], "sao-tome-and-principe");
    assert_eq!(res.data()["country_code"], "ST");
    assert_eq!(res.data()["location"]["lat"], 0.19);
    assert_eq!(res.data()["location"]["lng"], 6.61);

    let by_slug = app
        .get_without_token(&routes::country_slug("sao-tome-and-principe"))
        .await;
    assert_eq!(by_slug.status, 200);
    assert_eq!(by_slug.id(), res.id());
}

#[tokio::test]
async fn creating_requires_a_token() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(routes::COUNTRIES, &json!({"name": "Chile", "country_code": "CL"}))
        .await;

    assert_eq!(res.status, 401);
    assert_eq!(res.error_code(), "TOKEN_MISSING");
}

#[tokio::test]
async fn duplicate_slug_and_code_are_conflicts() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    app.create_country(&token, "Japan", "JP").await;

    let slug = app
        .post_with_token(
            routes::COUNTRIES,
            &json!({"name": "JAPAN", "country_code": "JX"}),
            &token,
        )
        .await;
    assert_eq!(slug.status, 409);
    assert_eq!(slug.error_code(), "COUNTRY_SLUG_EXISTS");
    assert_eq!(slug.body["details"]["slug"], "japan");

    let code = app
        .post_with_token(
            routes::COUNTRIES,
            &json!({"name": "Nippon", "country_code": "jp"}),
            &token,
        )
        .await;
    assert_eq!(code.status, 409);
    assert_eq!(code.error_code(), "COUNTRY_CODE_EXISTS");
}

#[tokio::test]
async fn invalid_code_and_location_are_rejected() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;

    for body in [
        json!({"name": "Peru", "country_code": "P3"}),
        json!({"name": "Peru", "country_code": "PE", "location": "north-ish"}),
        json!({"name": "Peru", "country_code": "PE", "location": "95, 10"}),
    ] {
        let res = app.post_with_token(routes::COUNTRIES, &body, &token).await;
        assert_eq!(res.status, 400, "{body}: {}", res.text);
        assert_eq!(res.error_code(), "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn unknown_image_reference_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;

    let res = app
        .post_with_token(
            routes::COUNTRIES,
            &json!({"name": "Peru", "country_code": "PE", "image_id": 4242}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "IMAGE_NOT_FOUND");
}

#[tokio::test]
async fn list_filters_and_destination_menu() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    for (name, code, menu) in [("Italy", "IT", true), ("France", "FR", false), ("Iceland", "IS", true)] {
        let res = app
            .post_with_token(
                routes::COUNTRIES,
                &json!({"name": name, "country_code": code, "showon_destmenu": menu}),
                &token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    let all = app.get_without_token(routes::COUNTRIES).await;
    assert_eq!(all.status, 200);
    assert_eq!(all.body["total"], 3);
    let names: Vec<&str> = all
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["France", "Iceland", "Italy"]);

    let search = app
        .get_without_token(&format!("{}?search=ITA&limit=1", routes::COUNTRIES))
        .await;
    assert_eq!(search.body["total"], 1);
    assert_eq!(search.body["limit"], 1);
    assert_eq!(search.data()[0]["name"], "Italy");

    let menu = app.get_without_token(routes::DESTINATION_MENU).await;
    assert_eq!(menu.status, 200);
    assert_eq!(menu.data().as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn partial_update_changes_only_given_fields() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    let id = app.create_country(&token, "Kenya", "KE").await;

    let res = app
        .patch_with_token(
            &routes::country(id),
            &json!({"showon_destmenu": true, "location": null}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["name"], "Kenya");
    assert_eq!(res.data()["slug"], "kenya");
    assert_eq!(res.data()["showon_destmenu"], true);
    assert!(res.data()["location"].is_null());

    let res = app
        .put_with_token(&routes::country(id), &json!({"slug": "Kenya Safari"}), &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["slug"], "kenya-safari");
}

#[tokio::test]
async fn update_to_taken_code_is_a_conflict() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    app.create_country(&token, "Norway", "NO").await;
    let id = app.create_country(&token, "Sweden", "SE").await;

    let res = app
        .put_with_token(&routes::country(id), &json!({"country_code": "no"}), &token)
        .await;

    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "COUNTRY_CODE_EXISTS");
}

#[tokio::test]
async fn delete_is_blocked_while_cities_reference_the_country() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    let country = app.create_country(&token, "Portugal", "PT").await;
    let city = app.create_city(&token, "Lisbon", country).await;

    let blocked = app.delete_with_token(&routes::country(country), &token).await;
    assert_eq!(blocked.status, 409);
    assert_eq!(blocked.error_code(), "RESOURCE_IN_USE");

    assert_eq!(app.delete_with_token(&routes::city(city), &token).await.status, 204);
    assert_eq!(app.delete_with_token(&routes::country(country), &token).await.status, 204);

    let gone = app.get_without_token(&routes::country(country)).await;
    assert_eq!(gone.status, 404);
}
