//! crates/readfy_core/src/domain.rs
//!
//! Defines the pure, core data structures for the catalog.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Dimensions
//=========================================================================================

/// The closed reading-status vocabulary of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadingStatus {
    #[default]
    NotStarted,
    InProgress,
    Finished,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [Self::NotStarted, Self::InProgress, Self::Finished];

    /// Canonical labels, as stored in the status dimension table.
    pub const LABELS: [&'static str; 3] = ["not_started", "in_progress", "finished"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
        }
    }

    /// Parses a status label. Matching ignores case and treats `-`, ` ` and `_`
    /// alike. The legacy labels `fechado`, `aberto` and `finalizado` are accepted
    /// as aliases.
    pub fn parse(label: &str) -> Option<Self> {
        let key = label.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "not_started" | "notstarted" | "fechado" => Some(Self::NotStarted),
            "in_progress" | "inprogress" | "aberto" => Some(Self::InProgress),
            "finished" | "finalizado" => Some(Self::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the genre dimension. `name` is always trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
}

/// A row of the status dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub id: Uuid,
    pub status: ReadingStatus,
}

//=========================================================================================
// Books
//=========================================================================================

/// Where a cover comes from. A book has at most one of the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverImage {
    /// A remote image URL.
    Url(String),
    /// An opaque handle to an uploaded binary, owned by the file store.
    Upload(String),
}

/// The caller-facing book, with its dimension keys resolved back to display values.
#[derive(Debug, Clone, PartialEq)]
pub struct BookView {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub status: ReadingStatus,
    pub publication_year: i32,
    pub pages: i32,
    pub rating: i32,
    pub current_page: i32,
    pub notes: String,
    pub isbn: Option<String>,
    pub cover_image: Option<CoverImage>,
    pub created_at: DateTime<Utc>,
}

/// A fully validated and normalized book, ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub genre_id: Uuid,
    pub status_id: Uuid,
    pub publication_year: i32,
    pub pages: i32,
    pub rating: i32,
    pub current_page: i32,
    pub notes: String,
    pub isbn: Option<String>,
    pub cover_image: Option<CoverImage>,
}

/// The normalized write-set of an update. `None` means "leave the column alone".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
    pub publication_year: Option<i32>,
    pub pages: Option<i32>,
    pub rating: Option<i32>,
    pub current_page: Option<i32>,
    pub notes: Option<String>,
    pub isbn: Option<Option<String>>,
    pub cover_image: Option<Option<CoverImage>>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Predicate for listing books. Results are always ordered by title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    /// Lower-cased fragment the genre name must contain.
    pub genre_contains: Option<String>,
}

//=========================================================================================
// Inbound Payloads
//=========================================================================================

/// A field of a sparse update that can also be cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Unchanged,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Patch::Unchanged)
    }
}

/// `None` is an absent key, `Some(None)` an explicit null.
impl<T> From<Option<Option<T>>> for Patch<T> {
    fn from(value: Option<Option<T>>) -> Self {
        match value {
            None => Patch::Unchanged,
            Some(None) => Patch::Clear,
            Some(Some(v)) => Patch::Set(v),
        }
    }
}

/// The JSON type a payload field is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    CoverImage,
}

impl FieldKind {
    pub fn describe(self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::CoverImage => "an object with a url or upload key",
        }
    }
}

/// A payload field whose value had the wrong type. The field itself is then
/// left empty and the mismatch is reported during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedField {
    /// Wire name of the field, e.g. `publicationYear`.
    pub field: &'static str,
    pub expected: FieldKind,
}

/// The raw input of a book registration. Required fields are still optional here
/// so that a missing one is reported alongside every other problem.
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publication_year: Option<f64>,
    pub pages: Option<f64>,
    pub status: Option<String>,
    pub rating: Option<f64>,
    pub isbn: Option<String>,
    pub current_page: Option<f64>,
    pub notes: Option<String>,
    pub cover_image: Option<CoverImage>,
    pub malformed: Vec<MalformedField>,
}

/// The raw input of a sparse update.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publication_year: Option<f64>,
    pub pages: Option<f64>,
    pub status: Option<String>,
    pub rating: Option<f64>,
    pub current_page: Option<f64>,
    pub notes: Patch<String>,
    pub isbn: Patch<String>,
    pub cover_image: Patch<CoverImage>,
    pub malformed: Vec<MalformedField>,
}

//=========================================================================================
// Reports
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub not_started: i64,
    pub in_progress: i64,
    pub finished: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub counts: StatusCounts,
    /// Sum of `pages` over finished books.
    pub pages_read: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_ignore_case_and_separators() {
        assert_eq!(ReadingStatus::parse("In-Progress"), Some(ReadingStatus::InProgress));
        assert_eq!(ReadingStatus::parse(" NOT STARTED "), Some(ReadingStatus::NotStarted));
        assert_eq!(ReadingStatus::parse("finalizado"), Some(ReadingStatus::Finished));
        assert_eq!(ReadingStatus::parse("reading"), None);
        for status in ReadingStatus::ALL {
            assert_eq!(ReadingStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn empty_changes_are_detected() {
        assert!(BookChanges::default().is_empty());
        let changes = BookChanges {
            isbn: Some(None),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn patch_from_double_option() {
        assert_eq!(Patch::<i32>::from(None), Patch::Unchanged);
        assert_eq!(Patch::<i32>::from(Some(None)), Patch::Clear);
        assert_eq!(Patch::from(Some(Some(3))), Patch::Set(3));
    }
}
