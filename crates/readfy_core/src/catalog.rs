//! crates/readfy_core/src/catalog.rs
//!
//! Read and delete operations over the catalog, and `BookCatalog`, the entry
//! point the service layer calls for every book operation.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{BookPatch, BookQuery, BookView, CatalogStats, Genre, NewBook};
use crate::error::CatalogResult;
use crate::planner::{CreatePlanner, UpdatePlanner};
use crate::policy::PagePolicy;
use crate::ports::CatalogStore;
use crate::resolver::normalize_genre;
use crate::stats::AggregateReporter;

/// Optional restrictions of a listing.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    /// Case-insensitive fragment of the genre name. Blank means no filter.
    pub genre: Option<String>,
}

//=========================================================================================
// Query Façade
//=========================================================================================

pub struct CatalogQuery<'a> {
    store: &'a dyn CatalogStore,
}

impl<'a> CatalogQuery<'a> {
    pub fn new(store: &'a dyn CatalogStore) -> Self {
        Self { store }
    }

    /// Books sorted by title, optionally restricted to genres containing a fragment.
    pub async fn list(&self, filter: &BookFilter) -> CatalogResult<Vec<BookView>> {
        let query = BookQuery {
            genre_contains: filter
                .genre
                .as_deref()
                .map(normalize_genre)
                .filter(|fragment| !fragment.is_empty()),
        };
        Ok(self.store.find_books(&query).await?)
    }

    pub async fn get_by_id(&self, book_id: Uuid) -> CatalogResult<BookView> {
        Ok(self.store.get_book_by_id(book_id).await?)
    }

    /// Hard delete. The book's genre row stays even if nothing references it anymore.
    pub async fn delete_by_id(&self, book_id: Uuid) -> CatalogResult<()> {
        self.store.delete_book(book_id).await?;
        info!(%book_id, "book deleted");
        Ok(())
    }

    pub async fn list_genres(&self) -> CatalogResult<Vec<Genre>> {
        Ok(self.store.list_genres().await?)
    }
}

//=========================================================================================
// Catalog Service
//=========================================================================================

/// Owns the store handle and the validation policy. Every call borrows the store
/// for the duration of one operation only.
#[derive(Clone)]
pub struct BookCatalog {
    store: Arc<dyn CatalogStore>,
    policy: PagePolicy,
}

impl BookCatalog {
    pub fn new(store: Arc<dyn CatalogStore>, policy: PagePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> PagePolicy {
        self.policy
    }

    pub async fn create_book(&self, input: NewBook) -> CatalogResult<BookView> {
        CreatePlanner::new(self.store.as_ref(), self.policy)
            .apply(input)
            .await
    }

    pub async fn update_book(&self, book_id: Uuid, patch: BookPatch) -> CatalogResult<BookView> {
        UpdatePlanner::new(self.store.as_ref(), self.policy)
            .apply(book_id, patch)
            .await
    }

    pub async fn get_book(&self, book_id: Uuid) -> CatalogResult<BookView> {
        CatalogQuery::new(self.store.as_ref()).get_by_id(book_id).await
    }

    pub async fn list_books(&self, filter: &BookFilter) -> CatalogResult<Vec<BookView>> {
        CatalogQuery::new(self.store.as_ref()).list(filter).await
    }

    pub async fn delete_book(&self, book_id: Uuid) -> CatalogResult<()> {
        CatalogQuery::new(self.store.as_ref()).delete_by_id(book_id).await
    }

    pub async fn list_genres(&self) -> CatalogResult<Vec<Genre>> {
        CatalogQuery::new(self.store.as_ref()).list_genres().await
    }

    pub async fn stats(&self) -> CatalogResult<CatalogStats> {
        AggregateReporter::new(self.store.as_ref()).stats().await
    }
}
