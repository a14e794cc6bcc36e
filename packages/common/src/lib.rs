pub mod config;
pub mod storage;

pub use config::{StorageAppConfig, StorageProvider};
