use axum::routing::patch;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{auth, city, country, home_destination, image, storage, user};
use crate::state::AppState;
use crate::upload::upload_body_limit;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let max_upload = config.storage.max_upload_size;
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/countries", country_routes())
        .nest("/cities", city_routes())
        .nest("/images", image_routes(max_upload))
        .nest("/storage", storage_routes(max_upload))
        .nest("/home-destinations", home_destination_routes(max_upload))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::me))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::list_users, user::create_user))
        .routes(routes!(user::get_user, user::update_user, user::delete_user))
        .route("/{id}", patch(user::update_user))
}

fn country_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(country::list_countries, country::create_country))
        .routes(routes!(country::destination_menu))
        .routes(routes!(country::get_country_by_slug))
        .routes(routes!(
            country::get_country,
            country::update_country,
            country::delete_country
        ))
        .route("/{id}", patch(country::update_country))
}

fn city_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(city::list_cities, city::create_city))
        .routes(routes!(city::get_city_by_slug))
        .routes(routes!(city::get_city, city::update_city, city::delete_city))
        .route("/{id}", patch(city::update_city))
}

fn image_routes(max_upload: u64) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(image::list_images, image::create_image))
        .routes(routes!(image::get_image, image::update_image, image::delete_image))
        .route("/{id}", patch(image::update_image));

    let upload = OpenApiRouter::new()
        .routes(routes!(image::upload_image))
        .layer(upload_body_limit(max_upload));

    crud.merge(upload)
}

fn storage_routes(max_upload: u64) -> OpenApiRouter<AppState> {
    let files = OpenApiRouter::new()
        .routes(routes!(storage::list_files))
        .routes(routes!(storage::get_file, storage::delete_file))
        .routes(routes!(storage::signed_url))
        .routes(routes!(storage::list_objects));

    let upload = OpenApiRouter::new()
        .routes(routes!(storage::upload_file))
        .layer(upload_body_limit(max_upload));

    files.merge(upload)
}

fn home_destination_routes(max_upload: u64) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            home_destination::list_destinations,
            home_destination::create_destination
        ))
        .routes(routes!(
            home_destination::get_destination,
            home_destination::update_destination,
            home_destination::delete_destination
        ))
        .route("/{id}", patch(home_destination::update_destination))
        .layer(upload_body_limit(max_upload))
}
