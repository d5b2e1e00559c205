//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API
//! server. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use readfy_core::domain::{
    BookPatch, BookView, CatalogStats, CoverImage, FieldKind, Genre, MalformedField, NewBook,
    Patch,
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Distinguishes an explicit `null` (`Some(None)`) from an absent key (`None`).
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

//=========================================================================================
// Payloads Sent FROM the Client TO the Server
//=========================================================================================

/// A cover is either a remote image URL or the handle of an uploaded file.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum CoverImagePayload {
    Url(String),
    Upload(String),
}

impl From<CoverImagePayload> for CoverImage {
    fn from(payload: CoverImagePayload) -> Self {
        match payload {
            CoverImagePayload::Url(url) => CoverImage::Url(url),
            CoverImagePayload::Upload(handle) => CoverImage::Upload(handle),
        }
    }
}

impl From<CoverImage> for CoverImagePayload {
    fn from(cover: CoverImage) -> Self {
        match cover {
            CoverImage::Url(url) => CoverImagePayload::Url(url),
            CoverImage::Upload(handle) => CoverImagePayload::Upload(handle),
        }
    }
}

/// A field value that either has the expected type or is kept verbatim, so that
/// a mistyped field is reported along with every other invalid field instead of
/// failing the whole body.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Lenient<T> {
    Valid(T),
    Mistyped(serde_json::Value),
}

/// Collects the fields that arrived with the wrong type while unwrapping them.
#[derive(Default)]
struct Mismatches(Vec<MalformedField>);

impl Mismatches {
    fn take<T>(
        &mut self,
        value: Option<Lenient<T>>,
        field: &'static str,
        expected: FieldKind,
    ) -> Option<T> {
        match value? {
            Lenient::Valid(value) => Some(value),
            Lenient::Mistyped(_) => {
                self.0.push(MalformedField { field, expected });
                None
            }
        }
    }

    /// A mistyped value leaves the field unchanged.
    fn patch<T>(
        &mut self,
        value: Option<Option<Lenient<T>>>,
        field: &'static str,
        expected: FieldKind,
    ) -> Patch<T> {
        match value {
            None => Patch::Unchanged,
            Some(None) => Patch::Clear,
            Some(value) => self
                .take(value, field, expected)
                .map_or(Patch::Unchanged, Patch::Set),
        }
    }
}

/// Registers a new book. `title`, `author`, `genre`, `publicationYear` and
/// `pages` are required; missing or mistyped ones are reported as validation
/// errors.
#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    #[schema(value_type = Option<String>)]
    pub title: Option<Lenient<String>>,
    #[schema(value_type = Option<String>)]
    pub author: Option<Lenient<String>>,
    #[schema(value_type = Option<String>)]
    pub genre: Option<Lenient<String>>,
    #[schema(value_type = Option<f64>)]
    pub publication_year: Option<Lenient<f64>>,
    #[schema(value_type = Option<f64>)]
    pub pages: Option<Lenient<f64>>,
    /// `not_started`, `in_progress` or `finished`.
    #[schema(value_type = Option<String>)]
    pub status: Option<Lenient<String>>,
    #[schema(value_type = Option<f64>)]
    pub rating: Option<Lenient<f64>>,
    #[schema(value_type = Option<String>)]
    pub isbn: Option<Lenient<String>>,
    #[schema(value_type = Option<f64>)]
    pub current_page: Option<Lenient<f64>>,
    #[schema(value_type = Option<String>)]
    pub notes: Option<Lenient<String>>,
    #[schema(value_type = Option<CoverImagePayload>)]
    pub cover_image: Option<Lenient<CoverImagePayload>>,
}

impl From<CreateBookRequest> for NewBook {
    fn from(req: CreateBookRequest) -> Self {
        use FieldKind::{CoverImage as Cover, Number, String as Text};
        let mut m = Mismatches::default();
        NewBook {
            title: m.take(req.title, "title", Text),
            author: m.take(req.author, "author", Text),
            genre: m.take(req.genre, "genre", Text),
            publication_year: m.take(req.publication_year, "publicationYear", Number),
            pages: m.take(req.pages, "pages", Number),
            status: m.take(req.status, "status", Text),
            rating: m.take(req.rating, "rating", Number),
            isbn: m.take(req.isbn, "isbn", Text),
            current_page: m.take(req.current_page, "currentPage", Number),
            notes: m.take(req.notes, "notes", Text),
            cover_image: m
                .take(req.cover_image, "coverImage", Cover)
                .map(CoverImage::from),
            malformed: m.0,
        }
    }
}

/// A sparse update. Absent keys are left untouched; `null` clears `notes`,
/// `isbn` and `coverImage`.
#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    #[schema(value_type = Option<String>)]
    pub title: Option<Lenient<String>>,
    #[schema(value_type = Option<String>)]
    pub author: Option<Lenient<String>>,
    #[schema(value_type = Option<String>)]
    pub genre: Option<Lenient<String>>,
    #[schema(value_type = Option<f64>)]
    pub publication_year: Option<Lenient<f64>>,
    #[schema(value_type = Option<f64>)]
    pub pages: Option<Lenient<f64>>,
    #[schema(value_type = Option<String>)]
    pub status: Option<Lenient<String>>,
    #[schema(value_type = Option<f64>)]
    pub rating: Option<Lenient<f64>>,
    #[schema(value_type = Option<f64>)]
    pub current_page: Option<Lenient<f64>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<Lenient<String>>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>)]
    pub isbn: Option<Option<Lenient<String>>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<CoverImagePayload>)]
    pub cover_image: Option<Option<Lenient<CoverImagePayload>>>,
}

impl From<UpdateBookRequest> for BookPatch {
    fn from(req: UpdateBookRequest) -> Self {
        use FieldKind::{CoverImage as Cover, Number, String as Text};
        let mut m = Mismatches::default();
        BookPatch {
            title: m.take(req.title, "title", Text),
            author: m.take(req.author, "author", Text),
            genre: m.take(req.genre, "genre", Text),
            publication_year: m.take(req.publication_year, "publicationYear", Number),
            pages: m.take(req.pages, "pages", Number),
            status: m.take(req.status, "status", Text),
            rating: m.take(req.rating, "rating", Number),
            current_page: m.take(req.current_page, "currentPage", Number),
            notes: m.patch(req.notes, "notes", Text),
            isbn: m.patch(req.isbn, "isbn", Text),
            cover_image: match m.patch(req.cover_image, "coverImage", Cover) {
                Patch::Unchanged => Patch::Unchanged,
                Patch::Clear => Patch::Clear,
                Patch::Set(cover) => Patch::Set(CoverImage::from(cover)),
            },
            malformed: m.0,
        }
    }
}

#[derive(Deserialize, IntoParams, Debug, Default)]
pub struct ListBooksQuery {
    /// Case-insensitive fragment of the genre name.
    pub genre: Option<String>,
}

//=========================================================================================
// Payloads Sent FROM the Server TO the Client
//=========================================================================================

#[derive(Serialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publication_year: i32,
    pub pages: i32,
    pub status: String,
    pub rating: i32,
    pub isbn: Option<String>,
    pub current_page: i32,
    pub notes: String,
    pub cover_image: Option<CoverImagePayload>,
    pub created_at: DateTime<Utc>,
}

impl From<BookView> for BookResponse {
    fn from(view: BookView) -> Self {
        BookResponse {
            id: view.id,
            title: view.title,
            author: view.author,
            genre: view.genre,
            publication_year: view.publication_year,
            pages: view.pages,
            status: view.status.as_str().to_string(),
            rating: view.rating,
            isbn: view.isbn,
            current_page: view.current_page,
            notes: view.notes,
            cover_image: view.cover_image.map(CoverImagePayload::from),
            created_at: view.created_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct BookListResponse {
    pub total: usize,
    pub books: Vec<BookResponse>,
}

impl From<Vec<BookView>> for BookListResponse {
    fn from(views: Vec<BookView>) -> Self {
        BookListResponse {
            total: views.len(),
            books: views.into_iter().map(BookResponse::from).collect(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct GenreListResponse {
    pub total: usize,
    pub genres: Vec<String>,
}

impl From<Vec<Genre>> for GenreListResponse {
    fn from(genres: Vec<Genre>) -> Self {
        GenreListResponse {
            total: genres.len(),
            genres: genres.into_iter().map(|g| g.name).collect(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total: i64,
    pub not_started: i64,
    pub in_progress: i64,
    pub finished: i64,
    pub pages_read: i64,
}

impl From<CatalogStats> for StatsResponse {
    fn from(stats: CatalogStats) -> Self {
        StatsResponse {
            total: stats.counts.total,
            not_started: stats.counts.not_started,
            in_progress: stats.counts.in_progress,
            finished: stats.counts.finished,
            pages_read: stats.pages_read,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// The body of every error response.
#[derive(Serialize, ToSchema, Debug)]
pub struct ErrorResponse {
    /// Machine-readable kind, e.g. `validation_failed` or `not_found`.
    pub error: String,
    pub message: String,
    /// Every failing field, for `validation_failed`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}
