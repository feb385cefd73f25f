//! Form-level input validation.
//!
//! Validators collect every problem in a [`FieldErrors`] instead of stopping
//! at the first, so a form can show all messages inline at once.

use std::collections::BTreeMap;

use serde::Serialize;

use shopcrm_core::Phone;

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field. The first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    /// Require a non-blank string.
    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("{field} is required"));
        }
    }

    /// Require a string no longer than `max` characters.
    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(field, format!("{field} must be at most {max} characters"));
        }
    }

    /// Require a valid phone number.
    pub fn phone(&mut self, field: &str, value: &str) {
        if let Err(e) = Phone::parse(value) {
            self.add(field, e.to_string());
        }
    }

    /// Require a strictly positive number.
    pub fn positive(&mut self, field: &str, value: i64) {
        if value <= 0 {
            self.add(field, format!("{field} must be greater than zero"));
        }
    }

    /// Require a number that is zero or more.
    pub fn non_negative(&mut self, field: &str, value: i64) {
        if value < 0 {
            self.add(field, format!("{field} cannot be negative"));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns the collected errors otherwise.
    pub fn finish(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_all_fields() {
        let mut errors = FieldErrors::new();
        errors.require("detail", "  ");
        errors.positive("duration_days", 0);
        errors.phone("phone", "abc");

        let errors = errors.finish().unwrap_err();
        assert_eq!(errors.get("detail"), Some("detail is required"));
        assert_eq!(
            errors.get("duration_days"),
            Some("duration_days must be greater than zero")
        );
        assert!(errors.get("phone").is_some());
    }

    #[test]
    fn test_first_message_wins() {
        let mut errors = FieldErrors::new();
        errors.require("name", "");
        errors.max_len("name", "", 0);
        errors.add("name", "other");
        assert_eq!(errors.get("name"), Some("name is required"));
    }

    #[test]
    fn test_clean_input_finishes_ok() {
        let mut errors = FieldErrors::new();
        errors.require("name", "Ann");
        errors.non_negative("points", 0);
        errors.phone("phone", "0812345678");
        assert!(errors.finish().is_ok());
    }

    #[test]
    fn test_serializes_as_map() {
        let mut errors = FieldErrors::new();
        errors.add("a", "x");
        assert_eq!(serde_json::to_string(&errors).unwrap(), r#"{"a":"x"}"#);
    }
}
