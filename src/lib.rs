// Public API for integration tests and potential library usage

pub mod api;
pub mod auth;
pub mod error;
pub mod protocol;
pub mod state;
pub mod types;
pub mod watcher;
