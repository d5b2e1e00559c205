pub mod protocol;
pub mod rest;
pub mod state;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use rest::{
    create_book_handler, delete_book_handler, get_book_handler, health_handler,
    list_books_handler, list_genres_handler, stats_handler, update_book_handler,
};
use state::AppState;

/// Builds the catalog routes. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/books", get(list_books_handler).post(create_book_handler))
        .route(
            "/books/{id}",
            get(get_book_handler)
                .patch(update_book_handler)
                .put(update_book_handler)
                .delete(delete_book_handler),
        )
        .route("/genres", get(list_genres_handler))
        .route("/stats", get(stats_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
