//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::errors::{Result, WaddleError};

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Highest page number honoured; later pages read as this one
pub const MAX_PAGE: i64 = 100_000;

/// Page selection accepted by every list endpoint
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl Pagination {
    /// Page number clamped to `1..=MAX_PAGE`
    pub fn page(&self) -> i64 {
        self.page.clamp(1, MAX_PAGE)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page(),
            limit: pagination.limit(),
        }
    }

    /// Transform the items while keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("email regex is valid")
    })
}

/// Lowercase and trim an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check the basic shape of an email address
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && email_regex().is_match(email)
}

/// Ensure a required text field is present and within bounds
pub fn require_text(field: &str, value: &str, max_len: usize) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WaddleError::Validation(format!("{} is required", field)));
    }
    if trimmed.chars().count() > max_len {
        return Err(WaddleError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

/// Validate an optional text field if present
pub fn optional_text(field: &str, value: Option<&str>, max_len: usize) -> Result<()> {
    match value {
        Some(v) => require_text(field, v, max_len),
        None => Ok(()),
    }
}

/// Validate a password against the minimum policy
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < 8 {
        return Err(WaddleError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    if password.len() > 128 {
        return Err(WaddleError::Validation(
            "password must be at most 128 characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate an optional age range
pub fn validate_age_range(min_age: Option<i16>, max_age: Option<i16>) -> Result<()> {
    for age in [min_age, max_age].into_iter().flatten() {
        if !(0..=120).contains(&age) {
            return Err(WaddleError::Validation("ages must be between 0 and 120".to_string()));
        }
    }
    if let (Some(min), Some(max)) = (min_age, max_age) {
        if min > max {
            return Err(WaddleError::Validation(
                "min_age cannot be greater than max_age".to_string(),
            ));
        }
    }
    Ok(())
}

/// Generate a numeric one-time code with the given number of digits
pub fn generate_numeric_code(digits: u32) -> String {
    let mut rng = rand::thread_rng();
    (0..digits)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Truncate text to a maximum length with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an amount in minor units for display, e.g. `1250, "gbp"` -> `12.50 GBP`
pub fn format_amount(amount_cents: i64, currency: &str) -> String {
    let sign = if amount_cents < 0 { "-" } else { "" };
    let abs = amount_cents.unsigned_abs();
    format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination { page: 0, limit: 1000 };
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), MAX_PAGE_SIZE);
        assert_eq!(p.offset(), 0);

        let p = Pagination { page: 3, limit: 10 };
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let p = Pagination {
            page: i64::MAX,
            limit: 100,
        };
        assert_eq!(p.page(), MAX_PAGE);
        assert_eq!(p.offset(), (MAX_PAGE - 1) * 100);
        assert!(p.offset() > 0);

        let p = Pagination {
            page: i64::MIN,
            limit: i64::MIN,
        };
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("parent@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co.uk"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert_eq!(normalize_email("  Parent@Example.COM "), "parent@example.com");
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_age_range() {
        assert!(validate_age_range(Some(3), Some(10)).is_ok());
        assert!(validate_age_range(None, Some(10)).is_ok());
        assert!(validate_age_range(Some(10), Some(3)).is_err());
        assert!(validate_age_range(Some(-1), None).is_err());
    }

    #[test]
    fn test_numeric_code() {
        let code = generate_numeric_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a very long title", 10), "a very ...");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1250, "gbp"), "12.50 GBP");
        assert_eq!(format_amount(5, "usd"), "0.05 USD");
        assert_eq!(format_amount(-300, "eur"), "-3.00 EUR");
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("title", "Story time", 10).is_ok());
        assert!(require_text("title", "   ", 10).is_err());
        assert!(require_text("title", "Far too long a title", 10).is_err());
    }
}
