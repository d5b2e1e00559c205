//! crates/readfy_core/src/stats.rs
//!
//! Catalog-wide aggregates for the dashboard.

use futures::try_join;

use crate::domain::{CatalogStats, ReadingStatus, StatusCounts};
use crate::error::CatalogResult;
use crate::ports::CatalogStore;

pub struct AggregateReporter<'a> {
    store: &'a dyn CatalogStore,
}

impl<'a> AggregateReporter<'a> {
    pub fn new(store: &'a dyn CatalogStore) -> Self {
        Self { store }
    }

    pub async fn count_by_status(&self) -> CatalogResult<StatusCounts> {
        let (not_started, in_progress, finished, total) = try_join!(
            self.store.count_books(Some(ReadingStatus::NotStarted)),
            self.store.count_books(Some(ReadingStatus::InProgress)),
            self.store.count_books(Some(ReadingStatus::Finished)),
            self.store.count_books(None),
        )?;
        Ok(StatusCounts {
            not_started,
            in_progress,
            finished,
            total,
        })
    }

    /// Pages of finished books only. Progress on unfinished books is not counted.
    pub async fn sum_pages_read(&self) -> CatalogResult<i64> {
        Ok(self.store.sum_pages(Some(ReadingStatus::Finished)).await?)
    }

    pub async fn stats(&self) -> CatalogResult<CatalogStats> {
        let (counts, pages_read) = try_join!(self.count_by_status(), self.sum_pages_read())?;
        Ok(CatalogStats { counts, pages_read })
    }
}
