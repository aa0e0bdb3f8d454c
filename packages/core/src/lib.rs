// Library root: exposes internal modules for integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod provider;
pub mod repository;
pub mod rules;
pub mod scheduler;
pub mod services;
pub mod store;
