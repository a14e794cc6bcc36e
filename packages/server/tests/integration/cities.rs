use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use server::entity::city;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn missing_country_is_rejected_and_nothing_is_written() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;

    let res = app
        .post_with_token(
            routes::CITIES,
            &json!({"name": "Atlantis", "country_id": 999}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "COUNTRY_NOT_FOUND");
    assert_eq!(city::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn create_applies_defaults() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    let country = app.create_country(&token, "Brazil", "BR").await;

    let res = app
        .post_with_token(
            routes::CITIES,
            &json!({"name": "São Paulo", "country_id": country}),
            &token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.data()["slug"], "sao-paulo");
    assert_eq!(res.data()["country_id"], country);
    assert_eq!(res.data()["is_active"], true);
    assert_eq!(res.data()["order"], 9999);

    let by_slug = app.get_without_token(&routes::city_slug("sao-paulo")).await;
    assert_eq!(by_slug.status, 200);
    assert_eq!(by_slug.data()["name"], "São Paulo");
}

#[tokio::test]
async fn duplicate_slug_is_a_conflict() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    let country = app.create_country(&token, "Spain", "ES").await;
    app.create_city(&token, "Valencia", country).await;

    let res = app
        .post_with_token(
            routes::CITIES,
            &json!({"name": "Other", "slug": "VALENCIA", "country_id": country}),
            &token,
        )
        .await;

    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "CITY_SLUG_EXISTS");
}

#[tokio::test]
async fn order_out_of_range_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    let country = app.create_country(&token, "Spain", "ES").await;

    let res = app
        .post_with_token(
            routes::CITIES,
            &json!({"name": "Seville", "country_id": country, "order": 10000}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn list_orders_by_order_and_filters() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    let italy = app.create_country(&token, "Italy", "IT").await;
    let greece = app.create_country(&token, "Greece", "GR").await;

    for (name, country, order, active) in [
        ("Rome", italy, 2, true),
        ("Milan", italy, 1, true),
        ("Venice", italy, 3, false),
        ("Athens", greece, 1, true),
    ] {
        let res = app
            .post_with_token(
                routes::CITIES,
                &json!({"name": name, "country_id": country, "order": order, "is_active": active}),
                &token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    let res = app
        .get_without_token(&format!(
            "{}?country_id={italy}&is_active=true",
            routes::CITIES
        ))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["total"], 2);
    assert_eq!(res.data()[0]["name"], "Milan");
    assert_eq!(res.data()[1]["name"], "Rome");

    let res = app
        .get_without_token(&format!("{}?search=ath", routes::CITIES))
        .await;
    assert_eq!(res.body["total"], 1);
    assert_eq!(res.data()[0]["name"], "Athens");
}

#[tokio::test]
async fn moving_to_a_missing_country_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    let country = app.create_country(&token, "Egypt", "EG").await;
    let id = app.create_city(&token, "Cairo", country).await;

    let res = app
        .patch_with_token(&routes::city(id), &json!({"country_id": 777}), &token)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "COUNTRY_NOT_FOUND");

    let unchanged = app.get_without_token(&routes::city(id)).await;
    assert_eq!(unchanged.data()["country_id"], country);
}

#[tokio::test]
async fn update_renames_and_deactivates() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    let country = app.create_country(&token, "Peru", "PE").await;
    let id = app.create_city(&token, "Cusco", country).await;

    let res = app
        .put_with_token(
            &routes::city(id),
            &json!({"name": "Cuzco", "slug": "Cuzco", "is_active": false, "location": "-13.53, -71.97"}),
            &token,
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["name"], "Cuzco");
    assert_eq!(res.data()["slug"], "cuzco");
    assert_eq!(res.data()["is_active"], false);
    assert_eq!(res.data()["location"]["lat"], -13.53);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.create_user("editor").await;
    let country = app.create_country(&token, "Chile", "CL").await;
    let id = app.create_city(&token, "Santiago", country).await;

    assert_eq!(app.delete_with_token(&routes::city(id), &token).await.status, 204);
    assert_eq!(app.get_without_token(&routes::city(id)).await.status, 404);
    assert_eq!(app.delete_with_token(&routes::city(id), &token).await.status, 404);
}
