//! crates/readfy_core/src/planner/update.rs
//!
//! Plans a sparse update of an existing book as a merge-patch.

use tracing::info;
use uuid::Uuid;

use super::{
    current_year, normalize_cover, normalize_isbn_input, valid_pages, validate_cover,
    validate_current_page, validate_pages, whole,
};
use crate::domain::{BookChanges, BookPatch, BookView, Patch};
use crate::error::{CatalogError, CatalogResult};
use crate::policy::PagePolicy;
use crate::ports::CatalogStore;
use crate::resolver::{normalize_genre, parse_status, DimensionResolver};
use crate::validation::{
    validate_isbn, validate_max_len, validate_required_string, validate_well_formed,
    validate_whole_number, FieldErrors, AUTHOR_LEN, GENRE_LEN, NOTES_MAX_LEN, RATING_RANGE,
    TITLE_LEN,
};

pub struct UpdatePlanner<'a> {
    store: &'a dyn CatalogStore,
    policy: PagePolicy,
}

impl<'a> UpdatePlanner<'a> {
    pub fn new(store: &'a dyn CatalogStore, policy: PagePolicy) -> Self {
        Self { store, policy }
    }

    /// Computes the write-set of `patch` against the stored book.
    ///
    /// Only fields present in the patch are validated, and fields whose
    /// normalized value equals the stored one are dropped. Fails with
    /// `NoFieldsToUpdate` when nothing is left.
    pub async fn plan(&self, book_id: Uuid, patch: BookPatch) -> CatalogResult<BookChanges> {
        let existing = self.store.get_book_by_id(book_id).await?;
        validate_patch(&patch, &existing, self.policy, current_year()).into_result()?;
        let status = patch.status.as_deref().map(parse_status).transpose()?;

        let resolver = DimensionResolver::new(self.store);
        let mut changes = BookChanges {
            title: changed(trimmed(patch.title), &existing.title),
            author: changed(trimmed(patch.author), &existing.author),
            publication_year: changed(
                patch.publication_year.map(whole),
                &existing.publication_year,
            ),
            pages: changed(patch.pages.map(whole), &existing.pages),
            rating: changed(patch.rating.map(whole), &existing.rating),
            current_page: changed(patch.current_page.map(whole), &existing.current_page),
            ..Default::default()
        };

        if let Some(label) = patch.genre.as_deref() {
            let name = normalize_genre(label);
            if name != existing.genre {
                changes.genre_id = Some(resolver.resolve_genre(&name).await?.id);
            }
        }
        if let Some(status) = status.filter(|s| *s != existing.status) {
            changes.status_id = Some(resolver.resolve_status(status).await?.id);
        }

        let notes = match patch.notes {
            Patch::Unchanged => None,
            Patch::Clear => Some(String::new()),
            Patch::Set(notes) => Some(notes.trim().to_string()),
        };
        changes.notes = changed(notes, &existing.notes);

        let isbn = match patch.isbn {
            Patch::Unchanged => None,
            Patch::Clear => Some(None),
            Patch::Set(raw) => Some(normalize_isbn_input(&raw)),
        };
        changes.isbn = changed(isbn, &existing.isbn);

        let cover_image = match patch.cover_image {
            Patch::Unchanged => None,
            Patch::Clear => Some(None),
            Patch::Set(cover) => Some(Some(normalize_cover(cover))),
        };
        changes.cover_image = changed(cover_image, &existing.cover_image);

        if changes.is_empty() {
            return Err(CatalogError::NoFieldsToUpdate);
        }
        Ok(changes)
    }

    /// Plans the update and writes it, returning the updated book.
    pub async fn apply(&self, book_id: Uuid, patch: BookPatch) -> CatalogResult<BookView> {
        let changes = self.plan(book_id, patch).await?;
        let view = self.store.update_book(book_id, changes).await?;
        info!(book_id = %view.id, "book updated");
        Ok(view)
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn changed<T: PartialEq>(incoming: Option<T>, current: &T) -> Option<T> {
    incoming.filter(|value| value != current)
}

fn validate_patch(
    patch: &BookPatch,
    existing: &BookView,
    policy: PagePolicy,
    year: i64,
) -> FieldErrors {
    let shape = |field: &str| validate_well_formed(&patch.malformed, field);
    let mut errors = FieldErrors::new();

    errors.check(shape("title"));
    if patch.title.is_some() {
        errors.check(validate_required_string(
            patch.title.as_deref(),
            "title",
            TITLE_LEN.0,
            TITLE_LEN.1,
        ));
    }
    errors.check(shape("author"));
    if patch.author.is_some() {
        errors.check(validate_required_string(
            patch.author.as_deref(),
            "author",
            AUTHOR_LEN.0,
            AUTHOR_LEN.1,
        ));
    }
    errors.check(shape("genre"));
    if patch.genre.is_some() {
        errors.check(validate_required_string(
            patch.genre.as_deref(),
            "genre",
            GENRE_LEN.0,
            GENRE_LEN.1,
        ));
    }
    errors.check(shape("publicationYear"));
    if patch.publication_year.is_some() {
        errors.check(validate_whole_number(
            patch.publication_year,
            "publicationYear",
            1,
            Some(year),
        ));
    }
    errors.check(shape("pages"));
    if patch.pages.is_some() {
        errors.check(validate_pages(patch.pages, policy));
    }
    errors.check(shape("rating"));
    if patch.rating.is_some() {
        errors.check(validate_whole_number(
            patch.rating,
            "rating",
            RATING_RANGE.0,
            Some(RATING_RANGE.1),
        ));
    }

    // The bound is the incoming page count when one is sent, the stored one otherwise.
    let pages_bound = if patch.pages.is_some() {
        valid_pages(patch.pages, policy)
    } else {
        Some(i64::from(existing.pages))
    };
    errors.check(shape("status")).check(shape("currentPage"));
    if patch.current_page.is_some() {
        errors.check(validate_current_page(patch.current_page, pages_bound, policy));
    } else if patch.pages.is_some()
        && pages_bound.is_some_and(|p| p > 0 && i64::from(existing.current_page) > p)
    {
        errors.check(Some(format!(
            "pages cannot be lower than the current page ({})",
            existing.current_page
        )));
    }

    errors
        .check(shape("notes"))
        .check(shape("isbn"))
        .check(shape("coverImage"));
    if let Patch::Set(notes) = &patch.notes {
        errors.check(validate_max_len(notes.trim(), "notes", NOTES_MAX_LEN));
    }
    if let Patch::Set(isbn) = &patch.isbn {
        errors.check(validate_isbn(Some(isbn)));
    }
    if let Patch::Set(cover) = &patch.cover_image {
        errors.check(validate_cover(cover));
    }
    errors
}
