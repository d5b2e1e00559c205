//! crates/readfy_core/src/resolver.rs
//!
//! Turns genre labels and status tags into dimension rows, creating rows on
//! first use.

use std::future::Future;

use tracing::{debug, info, warn};

use crate::domain::{Genre, ReadingStatus, StatusRow};
use crate::error::{CatalogError, CatalogResult};
use crate::ports::{CatalogStore, PortError, PortResult};
use crate::validation::{validate_enum, validate_required_string, GENRE_LEN};

/// The natural key of a genre: trimmed and lower-cased.
pub fn normalize_genre(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Parses a status label, failing with `InvalidEnum` for anything outside the
/// fixed vocabulary.
pub fn parse_status(label: &str) -> CatalogResult<ReadingStatus> {
    ReadingStatus::parse(label).ok_or_else(|| {
        CatalogError::InvalidEnum(
            validate_enum(label, &ReadingStatus::LABELS)
                .map(|reason| format!("status {}", reason))
                .unwrap_or_else(|| format!("status '{}' is not recognised", label.trim())),
        )
    })
}

pub struct DimensionResolver<'a> {
    store: &'a dyn CatalogStore,
}

impl<'a> DimensionResolver<'a> {
    pub fn new(store: &'a dyn CatalogStore) -> Self {
        Self { store }
    }

    /// Returns the genre row for `label`, creating it if needed. Labels differing
    /// only in case or surrounding whitespace resolve to the same row.
    pub async fn resolve_genre(&self, label: &str) -> CatalogResult<Genre> {
        let invalid = validate_required_string(Some(label), "genre", GENRE_LEN.0, GENRE_LEN.1);
        if let Some(message) = invalid {
            return Err(CatalogError::ValidationFailed(vec![message]));
        }
        let name = normalize_genre(label);
        get_or_create(
            &name,
            || self.store.find_genre_by_name(&name),
            || self.store.create_genre(&name),
        )
        .await
    }

    pub async fn resolve_status(&self, status: ReadingStatus) -> CatalogResult<StatusRow> {
        get_or_create(
            status.as_str(),
            || self.store.find_status(status),
            || self.store.create_status(status),
        )
        .await
    }

    /// Like `resolve_status`, from a free-text label. Unknown labels never create a row.
    pub async fn resolve_status_label(&self, label: &str) -> CatalogResult<StatusRow> {
        let status = parse_status(label)?;
        self.resolve_status(status).await
    }
}

/// Insert-if-absent. A unique conflict on create means a concurrent caller won
/// the race, so the row is read back once instead of failing.
async fn get_or_create<T, Find, FindFut, Create, CreateFut>(
    key: &str,
    find: Find,
    create: Create,
) -> CatalogResult<T>
where
    Find: Fn() -> FindFut,
    FindFut: Future<Output = PortResult<Option<T>>>,
    Create: FnOnce() -> CreateFut,
    CreateFut: Future<Output = PortResult<T>>,
{
    if let Some(existing) = find().await? {
        debug!(key, "dimension row found");
        return Ok(existing);
    }

    match create().await {
        Ok(created) => {
            info!(key, "dimension row created");
            Ok(created)
        }
        Err(PortError::Conflict(reason)) => {
            warn!(key, %reason, "dimension row created concurrently, re-fetching");
            find().await?.ok_or_else(|| {
                CatalogError::Storage(PortError::Unexpected(format!(
                    "dimension row '{}' missing after a unique conflict",
                    key
                )))
            })
        }
        Err(other) => Err(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCatalogStore;

    #[tokio::test]
    async fn genre_resolution_is_idempotent_across_casing() {
        let store = InMemoryCatalogStore::new();
        let resolver = DimensionResolver::new(&store);

        let first = resolver.resolve_genre("Fiction").await.unwrap();
        let second = resolver.resolve_genre(" fiction ").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.name, "fiction");
        assert_eq!(store.list_genres().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lost_creation_race_re_fetches_the_winner() {
        let store = InMemoryCatalogStore::new();
        store.race_next_genre_insert("poetry").await;
        let resolver = DimensionResolver::new(&store);

        let genre = resolver.resolve_genre("Poetry").await.unwrap();

        let genres = store.list_genres().await.unwrap();
        assert_eq!(genres, vec![genre]);
    }

    #[tokio::test]
    async fn lost_status_race_re_fetches_the_winner() {
        let store = InMemoryCatalogStore::new();
        store.race_next_status_insert(ReadingStatus::InProgress).await;
        let resolver = DimensionResolver::new(&store);

        let row = resolver.resolve_status_label("in-progress").await.unwrap();

        assert_eq!(row.status, ReadingStatus::InProgress);
        assert_eq!(
            store.find_status(ReadingStatus::InProgress).await.unwrap(),
            Some(row)
        );
    }

    #[tokio::test]
    async fn unknown_status_label_creates_nothing() {
        let store = InMemoryCatalogStore::new();
        let resolver = DimensionResolver::new(&store);

        let err = resolver.resolve_status_label("reading").await.unwrap_err();

        assert!(matches!(err, CatalogError::InvalidEnum(_)));
        for status in ReadingStatus::ALL {
            assert!(store.find_status(status).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn status_rows_are_reused() {
        let store = InMemoryCatalogStore::new();
        let resolver = DimensionResolver::new(&store);

        let a = resolver.resolve_status_label("Finished").await.unwrap();
        let b = resolver.resolve_status(ReadingStatus::Finished).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.status, ReadingStatus::Finished);
    }

    #[tokio::test]
    async fn blank_genre_is_a_validation_error() {
        let store = InMemoryCatalogStore::new();
        let resolver = DimensionResolver::new(&store);

        let err = resolver.resolve_genre("  ").await.unwrap_err();

        assert!(matches!(
            err,
            CatalogError::ValidationFailed(ref m) if m == &["genre is required"]
        ));
    }
}
