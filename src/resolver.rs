//! Page Resolver - maps request paths to pages
//!
//! Lookup is an exact string match on the stored path. There is no
//! trailing-slash or case normalization and no hierarchy traversal:
//! `/about-us` and `/about-us/services` resolve independently.

use serde::Serialize;
use tracing::debug;

use crate::locale::LocaleSettings;
use crate::page::Page;
use crate::storage::SqliteStore;
use crate::{Error, Result};

/// A page matched for a request, with the locale the request asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPage {
    pub page: Page,
    pub locale: String,
}

pub struct PageResolver<'a> {
    store: &'a SqliteStore,
}

impl<'a> PageResolver<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Find the page stored under exactly `path`.
    pub fn resolve(&self, path: &str) -> Result<Page> {
        match self.store.find_page_by_path(path)? {
            Some(page) => Ok(page),
            None => {
                debug!(path, "No page for path");
                Err(Error::PageNotFound(path.to_string()))
            }
        }
    }

    /// Resolve a request path that may carry a leading locale segment.
    ///
    /// `/fr/about-us` resolves `/about-us` in `fr`. A path without a
    /// supported locale prefix resolves as-is in the default locale.
    pub fn resolve_request(&self, raw_path: &str, locales: &LocaleSettings) -> Result<ResolvedPage> {
        let (prefix, path) = locales.split_prefix(raw_path);
        let locale = prefix.unwrap_or(locales.default.as_str()).to_string();
        let page = self.resolve(&path).map_err(|err| match err {
            Error::PageNotFound(_) => Error::PageNotFound(raw_path.to_string()),
            other => other,
        })?;
        Ok(ResolvedPage { page, locale })
    }
}
