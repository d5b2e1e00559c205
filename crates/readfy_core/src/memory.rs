//! crates/readfy_core/src/memory.rs
//!
//! An in-memory `CatalogStore`. It backs the service when no database is
//! configured and doubles as the store of the test suites, with hooks to inject
//! write failures and dimension-creation races.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    BookChanges, BookDraft, BookQuery, BookView, CoverImage, Genre, ReadingStatus, StatusRow,
};
use crate::ports::{CatalogStore, PortError, PortResult};

/// A stored book, with its dimensions held as keys.
#[derive(Debug, Clone)]
struct BookRecord {
    id: Uuid,
    title: String,
    author: String,
    genre_id: Uuid,
    status_id: Uuid,
    publication_year: i32,
    pages: i32,
    rating: i32,
    current_page: i32,
    notes: String,
    isbn: Option<String>,
    cover_image: Option<CoverImage>,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    genres: HashMap<Uuid, Genre>,
    statuses: HashMap<Uuid, StatusRow>,
    books: HashMap<Uuid, BookRecord>,
}

impl Tables {
    fn view(&self, record: &BookRecord) -> PortResult<BookView> {
        let genre = self.genres.get(&record.genre_id).ok_or_else(|| {
            PortError::Unexpected(format!("Book {} references a missing genre", record.id))
        })?;
        let status = self.statuses.get(&record.status_id).ok_or_else(|| {
            PortError::Unexpected(format!("Book {} references a missing status", record.id))
        })?;
        Ok(BookView {
            id: record.id,
            title: record.title.clone(),
            author: record.author.clone(),
            genre: genre.name.clone(),
            status: status.status,
            publication_year: record.publication_year,
            pages: record.pages,
            rating: record.rating,
            current_page: record.current_page,
            notes: record.notes.clone(),
            isbn: record.isbn.clone(),
            cover_image: record.cover_image.clone(),
            created_at: record.created_at,
        })
    }

    fn status_of(&self, record: &BookRecord) -> Option<ReadingStatus> {
        self.statuses.get(&record.status_id).map(|row| row.status)
    }

    fn check_references(&self, genre_id: Uuid, status_id: Uuid) -> PortResult<()> {
        if !self.genres.contains_key(&genre_id) {
            return Err(PortError::Unexpected(format!("Unknown genre id {}", genre_id)));
        }
        if !self.statuses.contains_key(&status_id) {
            return Err(PortError::Unexpected(format!("Unknown status id {}", status_id)));
        }
        Ok(())
    }
}

//=========================================================================================
// The Main Store Struct
//=========================================================================================

#[derive(Default)]
pub struct InMemoryCatalogStore {
    tables: RwLock<Tables>,
    racing_genres: RwLock<HashSet<String>>,
    racing_statuses: RwLock<HashSet<ReadingStatus>>,
    fail_book_writes: RwLock<bool>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `create_genre(name)` behaves as if another writer inserted the
    /// same name first: the row appears and the call fails with a conflict.
    pub async fn race_next_genre_insert(&self, name: &str) {
        self.racing_genres.write().await.insert(name.to_string());
    }

    /// Same as `race_next_genre_insert`, for the next `create_status(status)`.
    pub async fn race_next_status_insert(&self, status: ReadingStatus) {
        self.racing_statuses.write().await.insert(status);
    }

    /// Makes book inserts, updates and deletes fail with an unexpected error.
    pub async fn set_fail_book_writes(&self, fail: bool) {
        *self.fail_book_writes.write().await = fail;
    }

    async fn check_writable(&self) -> PortResult<()> {
        if *self.fail_book_writes.read().await {
            return Err(PortError::Unexpected("book table is unavailable".to_string()));
        }
        Ok(())
    }
}

//=========================================================================================
// `CatalogStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn find_genre_by_name(&self, name: &str) -> PortResult<Option<Genre>> {
        let tables = self.tables.read().await;
        Ok(tables.genres.values().find(|g| g.name == name).cloned())
    }

    async fn create_genre(&self, name: &str) -> PortResult<Genre> {
        let mut tables = self.tables.write().await;
        if tables.genres.values().any(|g| g.name == name) {
            return Err(PortError::Conflict(format!("genre '{}' already exists", name)));
        }
        let genre = Genre {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        tables.genres.insert(genre.id, genre.clone());
        drop(tables);

        if self.racing_genres.write().await.remove(name) {
            return Err(PortError::Conflict(format!(
                "genre '{}' was inserted concurrently",
                name
            )));
        }
        Ok(genre)
    }

    async fn list_genres(&self) -> PortResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        let mut genres: Vec<Genre> = tables.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(genres)
    }

    async fn find_status(&self, status: ReadingStatus) -> PortResult<Option<StatusRow>> {
        let tables = self.tables.read().await;
        Ok(tables.statuses.values().find(|s| s.status == status).cloned())
    }

    async fn create_status(&self, status: ReadingStatus) -> PortResult<StatusRow> {
        let mut tables = self.tables.write().await;
        if tables.statuses.values().any(|s| s.status == status) {
            return Err(PortError::Conflict(format!("status '{}' already exists", status)));
        }
        let row = StatusRow {
            id: Uuid::new_v4(),
            status,
        };
        tables.statuses.insert(row.id, row.clone());
        drop(tables);
        if self.racing_statuses.write().await.remove(&status) {
            return Err(PortError::Conflict(format!(
                "status '{}' was inserted concurrently",
                status
            )));
        }
        Ok(row)
    }

    async fn get_book_by_id(&self, book_id: Uuid) -> PortResult<BookView> {
        let tables = self.tables.read().await;
        let record = tables
            .books
            .get(&book_id)
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))?;
        tables.view(record)
    }

    async fn find_books(&self, query: &BookQuery) -> PortResult<Vec<BookView>> {
        let tables = self.tables.read().await;
        let mut views = tables
            .books
            .values()
            .map(|record| tables.view(record))
            .collect::<PortResult<Vec<_>>>()?;
        if let Some(fragment) = &query.genre_contains {
            views.retain(|v| v.genre.contains(fragment.as_str()));
        }
        views.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        Ok(views)
    }

    async fn create_book(&self, draft: BookDraft) -> PortResult<BookView> {
        self.check_writable().await?;
        let mut tables = self.tables.write().await;
        tables.check_references(draft.genre_id, draft.status_id)?;
        let record = BookRecord {
            id: Uuid::new_v4(),
            title: draft.title,
            author: draft.author,
            genre_id: draft.genre_id,
            status_id: draft.status_id,
            publication_year: draft.publication_year,
            pages: draft.pages,
            rating: draft.rating,
            current_page: draft.current_page,
            notes: draft.notes,
            isbn: draft.isbn,
            cover_image: draft.cover_image,
            created_at: Utc::now(),
        };
        let view = tables.view(&record)?;
        tables.books.insert(record.id, record);
        Ok(view)
    }

    async fn update_book(&self, book_id: Uuid, changes: BookChanges) -> PortResult<BookView> {
        self.check_writable().await?;
        let mut tables = self.tables.write().await;
        let mut record = tables
            .books
            .get(&book_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))?;

        if let Some(title) = changes.title {
            record.title = title;
        }
        if let Some(author) = changes.author {
            record.author = author;
        }
        if let Some(genre_id) = changes.genre_id {
            record.genre_id = genre_id;
        }
        if let Some(status_id) = changes.status_id {
            record.status_id = status_id;
        }
        if let Some(year) = changes.publication_year {
            record.publication_year = year;
        }
        if let Some(pages) = changes.pages {
            record.pages = pages;
        }
        if let Some(rating) = changes.rating {
            record.rating = rating;
        }
        if let Some(current_page) = changes.current_page {
            record.current_page = current_page;
        }
        if let Some(notes) = changes.notes {
            record.notes = notes;
        }
        if let Some(isbn) = changes.isbn {
            record.isbn = isbn;
        }
        if let Some(cover_image) = changes.cover_image {
            record.cover_image = cover_image;
        }
        tables.check_references(record.genre_id, record.status_id)?;

        let view = tables.view(&record)?;
        tables.books.insert(book_id, record);
        Ok(view)
    }

    async fn delete_book(&self, book_id: Uuid) -> PortResult<()> {
        self.check_writable().await?;
        let mut tables = self.tables.write().await;
        tables
            .books
            .remove(&book_id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))
    }

    async fn count_books(&self, status: Option<ReadingStatus>) -> PortResult<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .books
            .values()
            .filter(|r| status.is_none() || tables.status_of(r) == status)
            .count();
        Ok(count as i64)
    }

    async fn sum_pages(&self, status: Option<ReadingStatus>) -> PortResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .values()
            .filter(|r| status.is_none() || tables.status_of(r) == status)
            .map(|r| i64::from(r.pages))
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn draft(store: &InMemoryCatalogStore, title: &str, genre: &str) -> BookDraft {
        let genre = match store.find_genre_by_name(genre).await.unwrap() {
            Some(g) => g,
            None => store.create_genre(genre).await.unwrap(),
        };
        let status = match store.find_status(ReadingStatus::NotStarted).await.unwrap() {
            Some(s) => s,
            None => store.create_status(ReadingStatus::NotStarted).await.unwrap(),
        };
        BookDraft {
            title: title.to_string(),
            author: "Someone".to_string(),
            genre_id: genre.id,
            status_id: status.id,
            publication_year: 1965,
            pages: 100,
            rating: 0,
            current_page: 0,
            notes: String::new(),
            isbn: None,
            cover_image: None,
        }
    }

    #[tokio::test]
    async fn duplicate_genre_is_a_conflict() {
        let store = InMemoryCatalogStore::new();
        store.create_genre("fiction").await.unwrap();
        let err = store.create_genre("fiction").await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn books_are_listed_by_title_and_filtered_by_genre() {
        let store = InMemoryCatalogStore::new();
        for (title, genre) in [
            ("dune", "science fiction"),
            ("Emma", "romance"),
            ("Anathem", "science fiction"),
        ] {
            let d = draft(&store, title, genre).await;
            store.create_book(d).await.unwrap();
        }

        let all = store.find_books(&BookQuery::default()).await.unwrap();
        let titles: Vec<_> = all.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Anathem", "dune", "Emma"]);

        let query = BookQuery {
            genre_contains: Some("fiction".to_string()),
        };
        assert_eq!(store.find_books(&query).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_book_is_not_found() {
        let store = InMemoryCatalogStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.get_book_by_id(id).await, Err(PortError::NotFound(_))));
        assert!(matches!(store.delete_book(id).await, Err(PortError::NotFound(_))));
        assert!(matches!(
            store.update_book(id, BookChanges::default()).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn failing_writes_leave_the_table_untouched() {
        let store = InMemoryCatalogStore::new();
        let d = draft(&store, "Dune", "fiction").await;
        store.set_fail_book_writes(true).await;

        assert!(matches!(store.create_book(d).await, Err(PortError::Unexpected(_))));
        assert_eq!(store.count_books(None).await.unwrap(), 0);
    }
}
