//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `CatalogStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use readfy_core::domain::{
    BookChanges, BookDraft, BookQuery, BookView, CoverImage, Genre, ReadingStatus, StatusRow,
};
use readfy_core::ports::{CatalogStore, PortError, PortResult};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `CatalogStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Selects the denormalized book columns from `source`, aliased as `b`.
fn book_view_select(source: &str) -> String {
    format!(
        "SELECT b.id, b.title, b.author, g.name AS genre_name, s.name AS status_name, \
         b.publication_year, b.pages, b.rating, b.current_page, b.notes, b.isbn, \
         b.cover_url, b.cover_upload, b.created_at \
         FROM {} b \
         JOIN genres g ON g.id = b.genre_id \
         JOIN statuses s ON s.id = b.status_id",
        source
    )
}

fn map_db_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound("Row not found".to_string()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(db.message().to_string())
        }
        other => PortError::Unexpected(other.to_string()),
    }
}

/// Splits a cover into its `(cover_url, cover_upload)` columns.
fn cover_columns(cover: Option<CoverImage>) -> (Option<String>, Option<String>) {
    match cover {
        Some(CoverImage::Url(url)) => (Some(url), None),
        Some(CoverImage::Upload(handle)) => (None, Some(handle)),
        None => (None, None),
    }
}

fn parse_status_name(name: &str) -> PortResult<ReadingStatus> {
    ReadingStatus::parse(name)
        .ok_or_else(|| PortError::Unexpected(format!("Unknown status '{}' in database", name)))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct GenreRecord {
    id: Uuid,
    name: String,
}
impl GenreRecord {
    fn to_domain(self) -> Genre {
        Genre {
            id: self.id,
            name: self.name,
        }
    }
}

#[derive(FromRow)]
struct StatusRecord {
    id: Uuid,
    name: String,
}
impl StatusRecord {
    fn to_domain(self) -> PortResult<StatusRow> {
        Ok(StatusRow {
            id: self.id,
            status: parse_status_name(&self.name)?,
        })
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    title: String,
    author: String,
    genre_name: String,
    status_name: String,
    publication_year: i32,
    pages: i32,
    rating: i32,
    current_page: i32,
    notes: String,
    isbn: Option<String>,
    cover_url: Option<String>,
    cover_upload: Option<String>,
    created_at: DateTime<Utc>,
}
impl BookRecord {
    fn to_domain(self) -> PortResult<BookView> {
        let cover_image = match (self.cover_url, self.cover_upload) {
            (Some(url), _) => Some(CoverImage::Url(url)),
            (None, Some(handle)) => Some(CoverImage::Upload(handle)),
            (None, None) => None,
        };
        Ok(BookView {
            id: self.id,
            title: self.title,
            author: self.author,
            genre: self.genre_name,
            status: parse_status_name(&self.status_name)?,
            publication_year: self.publication_year,
            pages: self.pages,
            rating: self.rating,
            current_page: self.current_page,
            notes: self.notes,
            isbn: self.isbn,
            cover_image,
            created_at: self.created_at,
        })
    }
}

//=========================================================================================
// `CatalogStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for DbAdapter {
    async fn find_genre_by_name(&self, name: &str) -> PortResult<Option<Genre>> {
        let record =
            sqlx::query_as::<_, GenreRecord>("SELECT id, name FROM genres WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;
        Ok(record.map(GenreRecord::to_domain))
    }

    async fn create_genre(&self, name: &str) -> PortResult<Genre> {
        let record = sqlx::query_as::<_, GenreRecord>(
            "INSERT INTO genres (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(record.to_domain())
    }

    async fn list_genres(&self) -> PortResult<Vec<Genre>> {
        let records =
            sqlx::query_as::<_, GenreRecord>("SELECT id, name FROM genres ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_error)?;
        Ok(records.into_iter().map(GenreRecord::to_domain).collect())
    }

    async fn find_status(&self, status: ReadingStatus) -> PortResult<Option<StatusRow>> {
        let record =
            sqlx::query_as::<_, StatusRecord>("SELECT id, name FROM statuses WHERE name = $1")
                .bind(status.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;
        record.map(StatusRecord::to_domain).transpose()
    }

    async fn create_status(&self, status: ReadingStatus) -> PortResult<StatusRow> {
        let record = sqlx::query_as::<_, StatusRecord>(
            "INSERT INTO statuses (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        record.to_domain()
    }

    async fn get_book_by_id(&self, book_id: Uuid) -> PortResult<BookView> {
        let sql = format!("{} WHERE b.id = $1", book_view_select("books"));
        let record = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(book_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Book {} not found", book_id))
                }
                _ => map_db_error(e),
            })?;
        record.to_domain()
    }

    async fn find_books(&self, query: &BookQuery) -> PortResult<Vec<BookView>> {
        let sql = format!(
            "{} WHERE ($1::TEXT IS NULL OR strpos(g.name, $1) > 0) \
             ORDER BY lower(b.title) ASC, b.id ASC",
            book_view_select("books")
        );
        let records = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(query.genre_contains.as_deref())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;
        records.into_iter().map(BookRecord::to_domain).collect()
    }

    async fn create_book(&self, draft: BookDraft) -> PortResult<BookView> {
        let (cover_url, cover_upload) = cover_columns(draft.cover_image);
        let sql = format!(
            "WITH inserted AS ( \
                INSERT INTO books (id, title, author, genre_id, status_id, publication_year, \
                    pages, rating, current_page, notes, isbn, cover_url, cover_upload) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
                RETURNING * \
             ) {}",
            book_view_select("inserted")
        );
        let record = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(draft.title)
            .bind(draft.author)
            .bind(draft.genre_id)
            .bind(draft.status_id)
            .bind(draft.publication_year)
            .bind(draft.pages)
            .bind(draft.rating)
            .bind(draft.current_page)
            .bind(draft.notes)
            .bind(draft.isbn)
            .bind(cover_url)
            .bind(cover_upload)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        record.to_domain()
    }

    async fn update_book(&self, book_id: Uuid, changes: BookChanges) -> PortResult<BookView> {
        if changes.is_empty() {
            return self.get_book_by_id(book_id).await;
        }

        let mut builder = QueryBuilder::<Postgres>::new("WITH updated AS (UPDATE books SET ");
        {
            let mut set = builder.separated(", ");
            if let Some(title) = changes.title {
                set.push("title = ").push_bind_unseparated(title);
            }
            if let Some(author) = changes.author {
                set.push("author = ").push_bind_unseparated(author);
            }
            if let Some(genre_id) = changes.genre_id {
                set.push("genre_id = ").push_bind_unseparated(genre_id);
            }
            if let Some(status_id) = changes.status_id {
                set.push("status_id = ").push_bind_unseparated(status_id);
            }
            if let Some(year) = changes.publication_year {
                set.push("publication_year = ").push_bind_unseparated(year);
            }
            if let Some(pages) = changes.pages {
                set.push("pages = ").push_bind_unseparated(pages);
            }
            if let Some(rating) = changes.rating {
                set.push("rating = ").push_bind_unseparated(rating);
            }
            if let Some(current_page) = changes.current_page {
                set.push("current_page = ").push_bind_unseparated(current_page);
            }
            if let Some(notes) = changes.notes {
                set.push("notes = ").push_bind_unseparated(notes);
            }
            if let Some(isbn) = changes.isbn {
                set.push("isbn = ").push_bind_unseparated(isbn);
            }
            if let Some(cover) = changes.cover_image {
                // Both columns are written so that setting one clears the other.
                let (cover_url, cover_upload) = cover_columns(cover);
                set.push("cover_url = ").push_bind_unseparated(cover_url);
                set.push("cover_upload = ").push_bind_unseparated(cover_upload);
            }
        }
        builder
            .push(" WHERE id = ")
            .push_bind(book_id)
            .push(" RETURNING *) ")
            .push(book_view_select("updated"));

        let record = builder
            .build_query_as::<BookRecord>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))?;
        record.to_domain()
    }

    async fn delete_book(&self, book_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", book_id)));
        }
        Ok(())
    }

    async fn count_books(&self, status: Option<ReadingStatus>) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM books b \
             JOIN statuses s ON s.id = b.status_id \
             WHERE ($1::TEXT IS NULL OR s.name = $1)",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn sum_pages(&self, status: Option<ReadingStatus>) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(b.pages), 0)::BIGINT FROM books b \
             JOIN statuses s ON s.id = b.status_id \
             WHERE ($1::TEXT IS NULL OR s.name = $1)",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_columns_are_exclusive() {
        assert_eq!(
            cover_columns(Some(CoverImage::Url("https://x.test/a.png".to_string()))),
            (Some("https://x.test/a.png".to_string()), None)
        );
        assert_eq!(
            cover_columns(Some(CoverImage::Upload("uploads/a".to_string()))),
            (None, Some("uploads/a".to_string()))
        );
        assert_eq!(cover_columns(None), (None, None));
    }

    #[test]
    fn view_select_joins_both_dimensions() {
        let sql = book_view_select("books");
        assert!(sql.contains("FROM books b"));
        assert!(sql.contains("JOIN genres g ON g.id = b.genre_id"));
        assert!(sql.contains("JOIN statuses s ON s.id = b.status_id"));
    }

    #[test]
    fn unknown_status_names_are_unexpected() {
        assert!(matches!(parse_status_name("shelved"), Err(PortError::Unexpected(_))));
        assert_eq!(parse_status_name("finished"), Ok(ReadingStatus::Finished));
    }
}
