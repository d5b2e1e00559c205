//! crates/readfy_core/src/policy.rs
//!
//! Tunable rules of the validation layer.

use std::str::FromStr;

/// Largest page count accepted, matching the six-digit input mask of the forms.
pub const MAX_PAGES: i64 = 999_999;

/// Whether page counters may be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PagePolicy {
    /// `pages >= 0` and `current_page >= 0`.
    #[default]
    Permissive,
    /// `pages > 0`, and an explicitly supplied `current_page` must be `> 0`.
    Strict,
}

impl PagePolicy {
    pub fn min_pages(&self) -> i64 {
        match self {
            PagePolicy::Permissive => 0,
            PagePolicy::Strict => 1,
        }
    }

    pub fn min_current_page(&self) -> i64 {
        self.min_pages()
    }
}

impl FromStr for PagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permissive" => Ok(PagePolicy::Permissive),
            "strict" => Ok(PagePolicy::Strict),
            other => Err(format!(
                "'{}' is not a page policy (expected 'permissive' or 'strict')",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_policy_names() {
        assert_eq!("Strict".parse::<PagePolicy>(), Ok(PagePolicy::Strict));
        assert_eq!(" permissive ".parse::<PagePolicy>(), Ok(PagePolicy::Permissive));
        assert!("lenient".parse::<PagePolicy>().is_err());
    }

    #[test]
    fn strict_policy_rejects_zero() {
        assert_eq!(PagePolicy::Strict.min_pages(), 1);
        assert_eq!(PagePolicy::default().min_current_page(), 0);
    }
}
