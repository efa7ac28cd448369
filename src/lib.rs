// For integration tests only, dbimpact does binary-only packaging
pub mod cli;
pub mod config;
pub mod engine;
pub mod inference;
pub mod logging;
