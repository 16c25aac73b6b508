// Public API for integration tests and the server binary

pub mod api;
pub mod auth;
pub mod board;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod tasks;
pub mod types;
