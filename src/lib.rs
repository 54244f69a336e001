pub mod config;
pub mod errors;
pub mod models;
pub mod prompt;
pub mod providers;
pub mod session;
