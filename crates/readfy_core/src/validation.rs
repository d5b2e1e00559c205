//! crates/readfy_core/src/validation.rs
//!
//! Single-field checks. Every primitive is pure and total: it returns `None` when
//! the value is acceptable and a human-readable message otherwise.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::domain::MalformedField;
use crate::error::{CatalogError, CatalogResult};

pub const TITLE_LEN: (usize, usize) = (2, 150);
pub const AUTHOR_LEN: (usize, usize) = (2, 100);
pub const GENRE_LEN: (usize, usize) = (2, 50);
pub const NOTES_MAX_LEN: usize = 250;
pub const UPLOAD_HANDLE_MAX_LEN: usize = 512;
pub const RATING_RANGE: (i64, i64) = (0, 5);

static ISBN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{3}-\d{10}$").expect("ISBN pattern is valid"));
static IMAGE_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(jpeg|jpg|png|gif|webp|avif)$").expect("image pattern is valid")
});

//=========================================================================================
// Primitives
//=========================================================================================

/// Fails unless `value` is present and its trimmed length is within bounds.
pub fn validate_required_string(
    value: Option<&str>,
    field: &str,
    min_len: usize,
    max_len: usize,
) -> Option<String> {
    let trimmed = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Some(format!("{} is required", field)),
    };
    let len = trimmed.chars().count();
    if len < min_len || len > max_len {
        return Some(format!(
            "{} must be between {} and {} characters",
            field, min_len, max_len
        ));
    }
    None
}

/// Fails unless `value` is a finite number in `[min, max]`. `max` is optional.
pub fn validate_number_range(
    value: Option<f64>,
    field: &str,
    min: f64,
    max: Option<f64>,
) -> Option<String> {
    let n = match value {
        None => return Some(format!("{} is required", field)),
        Some(n) if !n.is_finite() => return Some(format!("{} must be a number", field)),
        Some(n) => n,
    };
    match max {
        Some(max) if n < min || n > max => {
            Some(format!("{} must be between {} and {}", field, min, max))
        }
        None if n < min => Some(format!("{} must be at least {}", field, min)),
        _ => None,
    }
}

/// `validate_number_range` over integers, rejecting fractional values.
pub fn validate_whole_number(
    value: Option<f64>,
    field: &str,
    min: i64,
    max: Option<i64>,
) -> Option<String> {
    validate_number_range(value, field, min as f64, max.map(|m| m as f64)).or_else(|| {
        match value {
            Some(n) if n.fract() != 0.0 => Some(format!("{} must be a whole number", field)),
            _ => None,
        }
    })
}

/// Fails unless `value` is, ignoring case and surrounding whitespace, one of `allowed`.
pub fn validate_enum(value: &str, allowed: &[&str]) -> Option<String> {
    let candidate = value.trim();
    if allowed.iter().any(|a| a.eq_ignore_ascii_case(candidate)) {
        None
    } else {
        Some(format!(
            "'{}' must be one of: {}",
            candidate,
            allowed.join(", ")
        ))
    }
}

/// Strips everything but digits and puts the dash back after the prefix,
/// the way the input mask renders it.
pub fn normalize_isbn(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() > 3 {
        format!("{}-{}", &digits[..3], &digits[3..])
    } else {
        digits
    }
}

/// Optional field: blank passes, anything else must normalize to `ddd-dddddddddd`.
pub fn validate_isbn(value: Option<&str>) -> Option<String> {
    match value.map(str::trim) {
        None | Some("") => None,
        Some(raw) if ISBN_PATTERN.is_match(&normalize_isbn(raw)) => None,
        Some(_) => Some("isbn must follow the pattern 978-XXXXXXXXXX".to_string()),
    }
}

/// Fails when `field` arrived with the wrong JSON type.
pub fn validate_well_formed(malformed: &[MalformedField], field: &str) -> Option<String> {
    malformed
        .iter()
        .find(|m| m.field == field)
        .map(|m| format!("{} must be {}", field, m.expected.describe()))
}

pub fn validate_max_len(value: &str, field: &str, max_len: usize) -> Option<String> {
    if value.chars().count() > max_len {
        Some(format!("{} must be at most {} characters", field, max_len))
    } else {
        None
    }
}

/// A cover URL must be absolute and point at an image file.
pub fn validate_cover_url(value: &str) -> Option<String> {
    match Url::parse(value.trim()) {
        Ok(url) if IMAGE_PATH_PATTERN.is_match(url.path()) => None,
        Ok(_) => Some(
            "coverImage must point to an image (.jpg, .jpeg, .png, .gif, .webp, .avif)"
                .to_string(),
        ),
        Err(_) => Some(
            "coverImage must be a valid URL (e.g. https://example.com/cover.jpg)".to_string(),
        ),
    }
}

//=========================================================================================
// Error Accumulation
//=========================================================================================

/// Collects every failing field of a payload instead of stopping at the first.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, outcome: Option<String>) -> &mut Self {
        if let Some(message) = outcome {
            self.0.push(message);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> CatalogResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::ValidationFailed(self.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldKind;

    #[test]
    fn required_string_trims_before_measuring() {
        assert_eq!(validate_required_string(Some("  Dune "), "title", 2, 150), None);
        assert_eq!(
            validate_required_string(Some("   "), "title", 2, 150).as_deref(),
            Some("title is required")
        );
        assert_eq!(
            validate_required_string(None, "author", 2, 100).as_deref(),
            Some("author is required")
        );
        assert!(validate_required_string(Some(" a "), "title", 2, 150).is_some());
        assert!(validate_required_string(Some(&"x".repeat(151)), "title", 2, 150).is_some());
    }

    #[test]
    fn number_range_rejects_non_numbers() {
        assert_eq!(
            validate_number_range(Some(f64::NAN), "pages", 0.0, None).as_deref(),
            Some("pages must be a number")
        );
        assert!(validate_number_range(Some(f64::INFINITY), "pages", 0.0, None).is_some());
        assert_eq!(
            validate_number_range(Some(-1.0), "pages", 0.0, None).as_deref(),
            Some("pages must be at least 0")
        );
        assert_eq!(
            validate_number_range(Some(6.0), "rating", 0.0, Some(5.0)).as_deref(),
            Some("rating must be between 0 and 5")
        );
        assert_eq!(validate_number_range(Some(5.0), "rating", 0.0, Some(5.0)), None);
    }

    #[test]
    fn whole_number_rejects_fractions() {
        assert_eq!(
            validate_whole_number(Some(2.5), "rating", 0, Some(5)).as_deref(),
            Some("rating must be a whole number")
        );
        assert_eq!(validate_whole_number(Some(3.0), "rating", 0, Some(5)), None);
    }

    #[test]
    fn enum_membership_ignores_case() {
        assert_eq!(validate_enum(" Finished ", &["not_started", "finished"]), None);
        assert!(validate_enum("reading", &["not_started", "finished"]).is_some());
    }

    #[test]
    fn isbn_is_masked_then_matched() {
        assert_eq!(normalize_isbn("978 0441013593"), "978-0441013593");
        assert_eq!(normalize_isbn("97"), "97");
        assert_eq!(validate_isbn(Some("978-0441013593")), None);
        assert_eq!(validate_isbn(Some("9780441013593")), None);
        assert_eq!(validate_isbn(None), None);
        assert_eq!(validate_isbn(Some("  ")), None);
        assert!(validate_isbn(Some("978-044101359")).is_some());
        assert!(validate_isbn(Some("978-04410135930")).is_some());
    }

    #[test]
    fn cover_url_must_be_an_image() {
        assert_eq!(validate_cover_url("https://example.com/covers/dune.JPG"), None);
        assert_eq!(validate_cover_url("https://example.com/dune.webp?size=large"), None);
        assert!(validate_cover_url("https://example.com/dune").is_some());
        assert!(validate_cover_url("not a url.png").is_some());
    }

    #[test]
    fn field_errors_keep_every_message() {
        let mut errors = FieldErrors::new();
        errors
            .check(validate_required_string(Some(""), "title", 2, 150))
            .check(validate_whole_number(Some(-1.0), "pages", 0, None))
            .check(None);
        match errors.into_result() {
            Err(CatalogError::ValidationFailed(messages)) => assert_eq!(messages.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn wrong_types_are_named_per_field() {
        let malformed = [MalformedField {
            field: "pages",
            expected: FieldKind::Number,
        }];
        assert_eq!(
            validate_well_formed(&malformed, "pages").as_deref(),
            Some("pages must be a number")
        );
        assert_eq!(validate_well_formed(&malformed, "title"), None);
    }
}
