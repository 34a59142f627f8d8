//! Machine-log dashboard API: router, application state, and configuration.

pub mod config;
pub mod server;
