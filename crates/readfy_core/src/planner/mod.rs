//! crates/readfy_core/src/planner/mod.rs
//!
//! Turns raw book payloads into normalized writes. Both planners validate the
//! whole payload before touching the store, so a rejected payload never leaves a
//! partially written book behind.

pub mod create;
pub mod update;

pub use create::CreatePlanner;
pub use update::UpdatePlanner;

use chrono::{Datelike, Utc};

use crate::domain::CoverImage;
use crate::policy::{PagePolicy, MAX_PAGES};
use crate::validation::{
    normalize_isbn, validate_cover_url, validate_required_string, validate_whole_number,
    UPLOAD_HANDLE_MAX_LEN,
};

fn current_year() -> i64 {
    i64::from(Utc::now().year())
}

fn validate_pages(value: Option<f64>, policy: PagePolicy) -> Option<String> {
    validate_whole_number(value, "pages", policy.min_pages(), Some(MAX_PAGES))
}

/// The page count usable as an upper bound, i.e. only a value that passed validation.
fn valid_pages(value: Option<f64>, policy: PagePolicy) -> Option<i64> {
    match validate_pages(value, policy) {
        None => value.map(|n| n as i64),
        Some(_) => None,
    }
}

/// `current_page` may not pass `pages` once `pages` is known and positive.
fn validate_current_page(
    value: Option<f64>,
    pages: Option<i64>,
    policy: PagePolicy,
) -> Option<String> {
    validate_whole_number(value, "currentPage", policy.min_current_page(), Some(MAX_PAGES))
        .or_else(|| match (value, pages) {
            (Some(current), Some(pages)) if pages > 0 && current > pages as f64 => Some(format!(
                "currentPage cannot exceed the number of pages ({})",
                pages
            )),
            _ => None,
        })
}

fn validate_cover(cover: &CoverImage) -> Option<String> {
    match cover {
        CoverImage::Url(url) => validate_cover_url(url),
        CoverImage::Upload(handle) => {
            validate_required_string(Some(handle), "coverImage", 1, UPLOAD_HANDLE_MAX_LEN)
        }
    }
}

fn normalize_cover(cover: CoverImage) -> CoverImage {
    match cover {
        CoverImage::Url(url) => CoverImage::Url(url.trim().to_string()),
        CoverImage::Upload(handle) => CoverImage::Upload(handle.trim().to_string()),
    }
}

/// Blank input means "no ISBN".
fn normalize_isbn_input(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(normalize_isbn(trimmed))
    }
}

/// Only called on values that passed range validation.
fn whole(value: f64) -> i32 {
    value as i32
}
