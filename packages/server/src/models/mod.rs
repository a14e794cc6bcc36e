pub mod auth;
pub mod city;
pub mod country;
pub mod envelope;
pub mod file;
pub mod health;
pub mod home_destination;
pub mod image;
pub mod shared;
pub mod user;
