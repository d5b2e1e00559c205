//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use readfy_core::BookCatalog;

/// The shared application state, created once at startup and passed to all handlers.
/// The catalog carries the configured page policy.
#[derive(Clone)]
pub struct AppState {
    pub catalog: BookCatalog,
}
