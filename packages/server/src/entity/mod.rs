pub mod city;
pub mod country;
pub mod file;
pub mod home_destination;
pub mod image;
pub mod user;
