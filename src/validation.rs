//! Field-level validation errors
//!
//! Every violation found for one submission is collected before anything is
//! persisted, so a caller can re-render a form with all messages at once.

use serde::Serialize;
use std::collections::BTreeMap;

pub const BLANK: &str = "can't be blank";

/// A single violation attached to a form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered collection of field errors for one record submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

/// Serializable view of [`ValidationErrors`] for the admin boundary
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub summary: String,
    pub count: usize,
    pub errors: BTreeMap<String, Vec<String>>,
    pub messages: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record a "can't be blank" error when `value` is missing or whitespace.
    pub fn require(&mut self, field: &str, value: Option<&str>) {
        if value.is_none_or(|v| v.trim().is_empty()) {
            self.add(field, BLANK);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    /// Messages recorded against `field`
    pub fn on(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Field names with at least one error, in first-seen order
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for e in &self.errors {
            if !fields.contains(&e.field.as_str()) {
                fields.push(&e.field);
            }
        }
        fields
    }

    /// Messages prefixed with the humanized field name, e.g. `Title can't be blank`
    pub fn full_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| format!("{} {}", humanize(&e.field), e.message))
            .collect()
    }

    /// e.g. `1 error prohibited this record from being saved:`
    pub fn summary(&self) -> String {
        let count = self.count();
        let noun = if count == 1 { "error" } else { "errors" };
        format!("{count} {noun} prohibited this record from being saved:")
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> crate::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::Error::Validation(self))
        }
    }

    pub fn report(&self) -> ValidationReport {
        let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for e in &self.errors {
            errors.entry(e.field.clone()).or_default().push(e.message.clone());
        }
        ValidationReport {
            summary: self.summary(),
            count: self.count(),
            errors,
            messages: self.full_messages(),
        }
    }
}

fn humanize(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_error_reporting() {
        let mut errors = ValidationErrors::new();
        errors.require("title", Some("   "));
        assert_eq!(errors.count(), 1);
        assert_eq!(errors.on("title"), vec![BLANK]);
        assert_eq!(errors.full_messages(), vec!["Title can't be blank".to_string()]);
        assert_eq!(errors.summary(), "1 error prohibited this record from being saved:");
    }

    #[test]
    fn test_collects_all_errors() {
        let mut errors = ValidationErrors::new();
        errors.require("title", None);
        errors.require("path", Some(""));
        errors.add("translations", "fr is not a valid locale");
        errors.require("body", Some("present"));

        assert_eq!(errors.count(), 3);
        assert_eq!(errors.fields(), vec!["title", "path", "translations"]);
        assert_eq!(errors.summary(), "3 errors prohibited this record from being saved:");

        let report = errors.report();
        assert_eq!(report.count, 3);
        assert_eq!(report.errors["path"], vec![BLANK.to_string()]);
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("link_url"), "Link url");
        assert_eq!(humanize(""), "");
    }
}
