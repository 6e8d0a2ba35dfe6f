pub mod types;
pub mod database;
pub mod config;
pub mod error;
pub mod transaction;
