//! crates/readfy_core/src/ports.rs
//!
//! Defines the storage contract for the catalog core.
//! The trait forms the boundary of the hexagonal architecture, allowing the core
//! to be independent of a specific relational store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    BookChanges, BookDraft, BookQuery, BookView, Genre, ReadingStatus, StatusRow,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all storage operations.
/// This abstracts away the specific errors of the underlying store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A unique constraint rejected the write.
    #[error("Unique constraint violated: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Port
//=========================================================================================

#[async_trait]
pub trait CatalogStore: Send + Sync {
    // --- Genre Dimension ---
    async fn find_genre_by_name(&self, name: &str) -> PortResult<Option<Genre>>;

    /// Inserts a genre. Fails with `PortError::Conflict` if the name is taken.
    async fn create_genre(&self, name: &str) -> PortResult<Genre>;

    /// All genres, ordered by name.
    async fn list_genres(&self) -> PortResult<Vec<Genre>>;

    // --- Status Dimension ---
    async fn find_status(&self, status: ReadingStatus) -> PortResult<Option<StatusRow>>;

    /// Inserts a status row. Fails with `PortError::Conflict` if it already exists.
    async fn create_status(&self, status: ReadingStatus) -> PortResult<StatusRow>;

    // --- Books ---
    async fn get_book_by_id(&self, book_id: Uuid) -> PortResult<BookView>;

    /// Books matching the query, ordered by title (case-insensitive), then id.
    async fn find_books(&self, query: &BookQuery) -> PortResult<Vec<BookView>>;

    async fn create_book(&self, draft: BookDraft) -> PortResult<BookView>;

    /// Applies only the columns set in `changes`.
    async fn update_book(&self, book_id: Uuid, changes: BookChanges) -> PortResult<BookView>;

    async fn delete_book(&self, book_id: Uuid) -> PortResult<()>;

    // --- Aggregates ---
    /// Number of books, optionally restricted to one status.
    async fn count_books(&self, status: Option<ReadingStatus>) -> PortResult<i64>;

    /// Sum of `pages`, optionally restricted to one status. Zero when nothing matches.
    async fn sum_pages(&self, status: Option<ReadingStatus>) -> PortResult<i64>;
}
