pub mod app;
pub mod commands;
pub mod config;
pub mod db;
pub mod documents;
pub mod error;
pub mod gateway;
pub mod models;
pub mod report;
pub mod session;
pub mod transcript;
pub mod upload;

pub use app::{App, View};
pub use config::AppConfig;
pub use db::Database;
pub use error::ClientError;
