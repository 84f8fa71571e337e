//! # pagecms - Pages and content blocks for storefronts
//!
//! pagecms provides:
//! - Path-addressed pages resolved by exact URL path (with optional locale prefix)
//! - Ordered, localizable content blocks attached to pages
//! - Attachment metadata with "don't clobber on omission" update semantics
//! - Atomic bulk position reassignment
//! - SQLite-backed storage and an axum HTTP surface for public and admin use

pub mod locale;
pub mod validation;
pub mod page;
pub mod content;
pub mod storage;
pub mod resolver;
pub mod contents;
pub mod server;
pub mod output;
pub mod config;
pub mod ui;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-exports for convenient access
pub use page::{NewPage, Page};
pub use content::{AttachmentMeta, AttachmentUpload, Content, ContentForm, LocalizedContent, Translation};
pub use locale::LocaleSettings;
pub use validation::ValidationErrors;
pub use storage::SqliteStore;
pub use resolver::PageResolver;
pub use contents::ContentStore;

/// Result type alias for pagecms operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pagecms operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// No page is stored under the requested path.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// A write referenced a page id that does not exist.
    #[error("Page {0} does not exist")]
    PageMissing(i64),

    #[error("Content not found: {0}")]
    ContentNotFound(i64),

    #[error("Path already taken: {0}")]
    DuplicatePath(String),

    #[error("{}", .0.summary())]
    Validation(ValidationErrors),

    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),
}

impl Error {
    /// True for misses that the HTTP boundary reports as 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::PageNotFound(_) | Error::PageMissing(_) | Error::ContentNotFound(_)
        )
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}
