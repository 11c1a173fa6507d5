pub mod catalog;
pub mod config;
pub mod errors;
pub mod loader;
pub mod registry;
pub mod resolution;
pub mod types;
