//! crates/readfy_core/src/planner/create.rs
//!
//! Plans the registration of a new book.

use tracing::info;

use super::{
    current_year, normalize_cover, normalize_isbn_input, valid_pages, validate_cover,
    validate_current_page, validate_pages, whole,
};
use crate::domain::{BookDraft, BookView, NewBook};
use crate::error::CatalogResult;
use crate::policy::PagePolicy;
use crate::ports::CatalogStore;
use crate::resolver::{parse_status, DimensionResolver};
use crate::validation::{
    validate_isbn, validate_max_len, validate_required_string, validate_well_formed,
    validate_whole_number, FieldErrors, AUTHOR_LEN, GENRE_LEN, NOTES_MAX_LEN, RATING_RANGE,
    TITLE_LEN,
};

pub struct CreatePlanner<'a> {
    store: &'a dyn CatalogStore,
    policy: PagePolicy,
}

impl<'a> CreatePlanner<'a> {
    pub fn new(store: &'a dyn CatalogStore, policy: PagePolicy) -> Self {
        Self { store, policy }
    }

    /// Validates `input`, resolves its dimensions and fills defaults.
    ///
    /// Every invalid field is reported at once. A genre row may be created as a
    /// side effect once validation has passed.
    pub async fn plan(&self, input: NewBook) -> CatalogResult<BookDraft> {
        validate_new_book(&input, self.policy, current_year()).into_result()?;
        let status = input
            .status
            .as_deref()
            .map(parse_status)
            .transpose()?
            .unwrap_or_default();

        let resolver = DimensionResolver::new(self.store);
        let genre = resolver
            .resolve_genre(input.genre.as_deref().unwrap_or_default())
            .await?;
        let status_row = resolver.resolve_status(status).await?;

        Ok(BookDraft {
            title: input.title.unwrap_or_default().trim().to_string(),
            author: input.author.unwrap_or_default().trim().to_string(),
            genre_id: genre.id,
            status_id: status_row.id,
            publication_year: input.publication_year.map(whole).unwrap_or_default(),
            pages: input.pages.map(whole).unwrap_or_default(),
            rating: input.rating.map(whole).unwrap_or_default(),
            current_page: input.current_page.map(whole).unwrap_or_default(),
            notes: input.notes.unwrap_or_default().trim().to_string(),
            isbn: input.isbn.as_deref().and_then(normalize_isbn_input),
            cover_image: input.cover_image.map(normalize_cover),
        })
    }

    /// Plans and inserts the book.
    pub async fn apply(&self, input: NewBook) -> CatalogResult<BookView> {
        let draft = self.plan(input).await?;
        let view = self.store.create_book(draft).await?;
        info!(book_id = %view.id, title = %view.title, "book created");
        Ok(view)
    }
}

fn validate_new_book(input: &NewBook, policy: PagePolicy, year: i64) -> FieldErrors {
    // A mistyped field is reported once, in place of its range or length check.
    let shape = |field: &str| validate_well_formed(&input.malformed, field);
    let mut errors = FieldErrors::new();
    errors
        .check(shape("title").or_else(|| {
            validate_required_string(input.title.as_deref(), "title", TITLE_LEN.0, TITLE_LEN.1)
        }))
        .check(shape("author").or_else(|| {
            validate_required_string(input.author.as_deref(), "author", AUTHOR_LEN.0, AUTHOR_LEN.1)
        }))
        .check(shape("genre").or_else(|| {
            validate_required_string(input.genre.as_deref(), "genre", GENRE_LEN.0, GENRE_LEN.1)
        }))
        .check(shape("publicationYear").or_else(|| {
            validate_whole_number(input.publication_year, "publicationYear", 1, Some(year))
        }))
        .check(shape("pages").or_else(|| validate_pages(input.pages, policy)))
        .check(shape("status"))
        .check(shape("rating"));

    if input.rating.is_some() {
        errors.check(validate_whole_number(
            input.rating,
            "rating",
            RATING_RANGE.0,
            Some(RATING_RANGE.1),
        ));
    }
    errors.check(shape("currentPage"));
    if input.current_page.is_some() {
        errors.check(validate_current_page(
            input.current_page,
            valid_pages(input.pages, policy),
            policy,
        ));
    }
    errors.check(shape("notes"));
    if let Some(notes) = &input.notes {
        errors.check(validate_max_len(notes.trim(), "notes", NOTES_MAX_LEN));
    }
    errors.check(shape("coverImage"));
    if let Some(cover) = &input.cover_image {
        errors.check(validate_cover(cover));
    }
    errors
        .check(shape("isbn"))
        .check(validate_isbn(input.isbn.as_deref()));
    errors
}
