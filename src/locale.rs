//! Locale handling
//!
//! Content fields are localized through an explicit `locale -> {title, body}`
//! map. A locale tag is a short ASCII identifier such as `en`, `fr` or
//! `pt-BR`. The site carries a default locale (whose values are the base
//! fields) plus the list of locales that may appear as URL prefixes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Locale used when nothing else is configured
pub const DEFAULT_LOCALE: &str = "en";

const MAX_TAG_LEN: usize = 16;

/// Check whether `tag` is a well-formed locale tag.
///
/// Accepted: an ASCII letter followed by letters, digits, `-` or `_`,
/// at most 16 characters, with no trailing or doubled separator.
pub fn is_valid_tag(tag: &str) -> bool {
    if tag.is_empty() || tag.len() > MAX_TAG_LEN {
        return false;
    }
    if !tag.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return false;
    }
    if tag.ends_with(['-', '_']) || tag.contains("--") || tag.contains("__") {
        return false;
    }
    tag.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validate a locale tag, returning it trimmed.
pub fn parse_tag(tag: &str) -> Result<String> {
    let trimmed = tag.trim();
    if is_valid_tag(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(Error::InvalidLocale(tag.to_string()))
    }
}

/// Locales known to the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleSettings {
    /// Locale whose values are stored in the base fields
    pub default: String,
    /// All locales accepted as URL prefixes; always contains `default` first
    pub supported: Vec<String>,
}

impl LocaleSettings {
    pub fn new(default: &str, supported: &[String]) -> Result<Self> {
        let default = parse_tag(default)?;
        let mut all = vec![default.clone()];
        for tag in supported {
            let tag = parse_tag(tag)?;
            if !all.contains(&tag) {
                all.push(tag);
            }
        }
        Ok(Self { default, supported: all })
    }

    pub fn is_supported(&self, tag: &str) -> bool {
        self.supported.iter().any(|l| l == tag)
    }

    /// Split a leading locale segment off a request path.
    ///
    /// `/fr/about-us` becomes `(Some("fr"), "/about-us")` and `/fr` becomes
    /// `(Some("fr"), "/")`. Paths whose first segment is not a supported
    /// locale are returned unchanged.
    pub fn split_prefix<'a>(&self, path: &'a str) -> (Option<&'a str>, String) {
        let Some(rest) = path.strip_prefix('/') else {
            return (None, path.to_string());
        };
        let (first, remainder) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        if first.is_empty() || !self.is_supported(first) {
            return (None, path.to_string());
        }
        let remainder = if remainder.is_empty() { "/" } else { remainder };
        (Some(first), remainder.to_string())
    }
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            default: DEFAULT_LOCALE.to_string(),
            supported: vec![DEFAULT_LOCALE.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en_fr() -> LocaleSettings {
        LocaleSettings::new("en", &["fr".to_string(), "en".to_string()]).unwrap()
    }

    #[test]
    fn test_tag_validation() {
        assert!(is_valid_tag("en"));
        assert!(is_valid_tag("pt-BR"));
        assert!(is_valid_tag("zh_Hant"));
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag("1en"));
        assert!(!is_valid_tag("en-"));
        assert!(!is_valid_tag("en--us"));
        assert!(!is_valid_tag("en us"));
        assert!(!is_valid_tag("averyveryverylongtag"));
    }

    #[test]
    fn test_settings_dedup_and_default_first() {
        let settings = en_fr();
        assert_eq!(settings.default, "en");
        assert_eq!(settings.supported, vec!["en".to_string(), "fr".to_string()]);
        assert!(LocaleSettings::new("en", &["f r".to_string()]).is_err());
    }

    #[test]
    fn test_split_prefix() {
        let settings = en_fr();
        assert_eq!(settings.split_prefix("/fr/about-us"), (Some("fr"), "/about-us".to_string()));
        assert_eq!(settings.split_prefix("/en"), (Some("en"), "/".to_string()));
        assert_eq!(settings.split_prefix("/fr/"), (Some("fr"), "/".to_string()));
        assert_eq!(settings.split_prefix("/about-us"), (None, "/about-us".to_string()));
        assert_eq!(settings.split_prefix("/"), (None, "/".to_string()));
        assert_eq!(settings.split_prefix("/de/page"), (None, "/de/page".to_string()));
        assert_eq!(settings.split_prefix(""), (None, String::new()));
    }
}
