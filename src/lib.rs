pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod safety;
pub mod services;
pub mod state;

pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;
