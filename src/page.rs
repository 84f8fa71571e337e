//! Page records
//!
//! A page is addressed by its exact `path`. Paths are only hierarchical by
//! string shape: `/about-us/services` is a sibling record of `/about-us`,
//! not a child object.

use crate::Result;
use crate::validation::ValidationErrors;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub title: String,
    /// Unique lookup key
    pub path: String,
}

/// Input for creating a page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPage {
    pub title: String,
    pub path: String,
}

impl NewPage {
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        errors.require("title", Some(&self.title));
        errors.require("path", Some(&self.path));
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_new_page_validation() {
        assert!(NewPage::new("Home", "/").validate().is_ok());

        match NewPage::new(" ", "").validate() {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.fields(), vec!["title", "path"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
