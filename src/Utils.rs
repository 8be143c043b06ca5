//! different utility modules used throughout the project
/// TOML configuration of the server and the integration engine
pub mod config;
/// terminal and file logging
pub mod logger;
