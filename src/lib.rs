pub mod analytics;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod ranking;
pub mod scoring;
pub mod server;
pub mod snapshot;
pub mod suggestions;
