pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod overlay;
pub mod report;
pub mod session;
pub mod thumbnail;
pub mod vision;
