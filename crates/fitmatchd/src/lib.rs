//! FitMatch daemon library - exposes modules for testing.

pub mod config;
pub mod pipeline;
pub mod routes;
pub mod server;
