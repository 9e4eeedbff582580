//! Application-level models: CLI arguments and file configuration

pub mod arg;
pub mod config;
