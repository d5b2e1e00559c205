//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    BookListResponse, BookResponse, CoverImagePayload, CreateBookRequest, DeleteResponse,
    ErrorResponse, GenreListResponse, ListBooksQuery, StatsResponse, UpdateBookRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use readfy_core::{BookFilter, CatalogError};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_book_handler,
        list_books_handler,
        get_book_handler,
        update_book_handler,
        delete_book_handler,
        list_genres_handler,
        stats_handler,
    ),
    components(
        schemas(
            CreateBookRequest,
            UpdateBookRequest,
            CoverImagePayload,
            BookResponse,
            BookListResponse,
            GenreListResponse,
            StatsResponse,
            DeleteResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Readfy API", description = "Personal book catalog: books, genres and reading statistics.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Everything a handler can answer with instead of a success. Handlers return it
/// with `?`.
#[derive(Debug)]
pub enum RestError {
    Catalog(CatalogError),
    /// The body could not be read as a JSON object at all.
    Body(JsonRejection),
}

impl From<CatalogError> for RestError {
    fn from(err: CatalogError) -> Self {
        RestError::Catalog(err)
    }
}

impl From<JsonRejection> for RestError {
    fn from(rejection: JsonRejection) -> Self {
        RestError::Body(rejection)
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, kind, message, errors) = match self {
            RestError::Catalog(err) => catalog_error_parts(err),
            RestError::Body(rejection) => (
                rejection.status(),
                "malformed_body",
                rejection.body_text(),
                Vec::new(),
            ),
        };
        if status.is_client_error() {
            warn!(kind, message = message.as_str(), "request rejected");
        }
        let body = ErrorResponse {
            error: kind.to_string(),
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

fn catalog_error_parts(err: CatalogError) -> (StatusCode, &'static str, String, Vec<String>) {
    match err {
        CatalogError::ValidationFailed(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_failed",
            "One or more fields are invalid.".to_string(),
            errors,
        ),
        CatalogError::NotFound(what) => (StatusCode::NOT_FOUND, "not_found", what, Vec::new()),
        CatalogError::InvalidEnum(reason) => {
            (StatusCode::BAD_REQUEST, "invalid_enum", reason, Vec::new())
        }
        CatalogError::NoFieldsToUpdate => (
            StatusCode::BAD_REQUEST,
            "no_fields_to_update",
            "No fields to update.".to_string(),
            Vec::new(),
        ),
        CatalogError::Storage(e) => {
            error!("Storage failure: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "An internal error occurred while accessing the catalog.".to_string(),
                Vec::new(),
            )
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Register a new book.
///
/// Unknown genres are created on first use. Omitted optional fields get their
/// defaults (`status = not_started`, `rating = 0`, `currentPage = 0`).
#[utoipa::path(
    post,
    path = "/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Unknown status label, or unreadable JSON", body = ErrorResponse),
        (status = 422, description = "One or more invalid or mistyped fields", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_book_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RestError> {
    let Json(payload) = payload?;
    let book = app_state.catalog.create_book(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// List books sorted by title, optionally filtered by genre.
#[utoipa::path(
    get,
    path = "/books",
    params(ListBooksQuery),
    responses(
        (status = 200, description = "Books sorted by title", body = BookListResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_books_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListBooksQuery>,
) -> Result<Json<BookListResponse>, RestError> {
    let filter = BookFilter { genre: query.genre };
    let books = app_state.catalog.list_books(&filter).await?;
    Ok(Json(books.into()))
}

/// Fetch one book.
#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "The book id.")),
    responses(
        (status = 200, description = "The book", body = BookResponse),
        (status = 404, description = "No book with this id", body = ErrorResponse)
    )
)]
pub async fn get_book_handler(
    State(app_state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResponse>, RestError> {
    let book = app_state.catalog.get_book(book_id).await?;
    Ok(Json(book.into()))
}

/// Update some fields of a book.
///
/// Only the keys present in the body are changed. `null` clears `notes`,
/// `isbn` and `coverImage`.
#[utoipa::path(
    patch,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "The book id.")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "The updated book", body = BookResponse),
        (status = 400, description = "Unknown status label, or nothing to update", body = ErrorResponse),
        (status = 404, description = "No book with this id", body = ErrorResponse),
        (status = 422, description = "One or more invalid or mistyped fields", body = ErrorResponse)
    )
)]
pub async fn update_book_handler(
    State(app_state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    payload: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> Result<Json<BookResponse>, RestError> {
    let Json(payload) = payload?;
    let book = app_state.catalog.update_book(book_id, payload.into()).await?;
    Ok(Json(book.into()))
}

/// Delete a book. Its genre is kept.
#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "The book id.")),
    responses(
        (status = 200, description = "Book deleted", body = DeleteResponse),
        (status = 404, description = "No book with this id", body = ErrorResponse)
    )
)]
pub async fn delete_book_handler(
    State(app_state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, RestError> {
    app_state.catalog.delete_book(book_id).await?;
    Ok(Json(DeleteResponse { deleted: true }))
}

/// List every genre name, sorted.
#[utoipa::path(
    get,
    path = "/genres",
    responses(
        (status = 200, description = "Genre names", body = GenreListResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_genres_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<GenreListResponse>, RestError> {
    let genres = app_state.catalog.list_genres().await?;
    Ok(Json(genres.into()))
}

/// Catalog statistics: counts by status and pages read across finished books.
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Catalog statistics", body = StatsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn stats_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, RestError> {
    let stats = app_state.catalog.stats().await?;
    Ok(Json(stats.into()))
}

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
