pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod indexer;
pub mod pipeline;
pub mod retry;
pub mod tokens;
pub mod wallet;
