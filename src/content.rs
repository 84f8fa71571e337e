//! Content blocks
//!
//! A content block belongs to one page and carries display data: a title,
//! an optional body, link fields, an optional attachment and a position
//! that orders blocks within their page.
//!
//! `title` and `body` are localizable. The base fields hold the default
//! locale's values and `translations` maps other locales to overrides.
//! Resolution is per field: a locale's title is used only when it is
//! non-blank, otherwise the base title is kept (same for body).

use crate::locale;
use crate::validation::ValidationErrors;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Per-locale override of the localizable fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl Translation {
    pub fn new(title: Option<&str>, body: Option<&str>) -> Self {
        Self {
            title: title.map(str::to_string),
            body: body.map(str::to_string),
        }
    }

    /// A translation with neither a title nor a body carries nothing.
    pub fn is_blank(&self) -> bool {
        non_blank(self.title.as_deref()).is_none() && non_blank(self.body.as_deref()).is_none()
    }
}

/// Metadata derived from an uploaded attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    /// blake3 hex digest of the bytes
    pub fingerprint: String,
}

/// An attachment as submitted through the admin form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentUpload {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl AttachmentUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<&str>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.map(str::to_string),
            data,
        }
    }

    /// Stored file name: the last path component of the submitted name.
    pub fn sanitized_file_name(&self) -> Option<String> {
        let name = self
            .file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();
        if name.is_empty() || name == "." || name == ".." {
            None
        } else {
            Some(name.to_string())
        }
    }

    pub fn meta(&self) -> Result<AttachmentMeta> {
        let file_name = self
            .sanitized_file_name()
            .ok_or_else(|| crate::Error::InvalidAttachment(self.file_name.clone()))?;
        let content_type = non_blank(self.content_type.as_deref())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        Ok(AttachmentMeta {
            file_name,
            content_type,
            file_size: self.data.len() as i64,
            fingerprint: blake3::hash(&self.data).to_hex().to_string(),
        })
    }
}

/// A stored content block with its base fields and all translations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub id: i64,
    pub page_id: i64,
    pub title: String,
    pub body: Option<String>,
    /// Free-form tag distinguishing several blocks on one page
    pub context: Option<String>,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    pub hide_title: bool,
    pub position: i64,
    pub attachment: Option<AttachmentMeta>,
    pub translations: BTreeMap<String, Translation>,
}

impl Content {
    pub fn title_in(&self, locale: &str) -> &str {
        let variant = self.translations.get(locale).and_then(|t| t.title.as_deref());
        non_blank(variant).unwrap_or(&self.title)
    }

    pub fn body_in(&self, locale: &str) -> Option<&str> {
        let variant = self.translations.get(locale).and_then(|t| t.body.as_deref());
        non_blank(variant).or(self.body.as_deref())
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }

    /// Resolve the localizable fields for `locale`.
    pub fn localized(&self, locale: &str) -> LocalizedContent {
        LocalizedContent {
            id: self.id,
            page_id: self.page_id,
            locale: locale.to_string(),
            title: self.title_in(locale).to_string(),
            body: self.body_in(locale).map(str::to_string),
            context: self.context.clone(),
            link_url: self.link_url.clone(),
            link_text: self.link_text.clone(),
            hide_title: self.hide_title,
            position: self.position,
            attachment: self.attachment.clone(),
        }
    }
}

/// A content block as seen by a reader in one locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedContent {
    pub id: i64,
    pub page_id: i64,
    pub locale: String,
    pub title: String,
    pub body: Option<String>,
    pub context: Option<String>,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    pub hide_title: bool,
    pub position: i64,
    pub attachment: Option<AttachmentMeta>,
}

/// Admin form submission used by both create and update
///
/// On update the scalar fields are a full replacement: an omitted `body`,
/// `context`, `link_url` or `link_text` is stored as empty. Translations and
/// the attachment only change when the form mentions them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentForm {
    /// Target page; create falls back to the page in the request scope
    #[serde(default)]
    pub page_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub link_text: Option<String>,
    #[serde(default)]
    pub hide_title: bool,
    /// `None` appends on create and keeps the current position on update
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub translations: BTreeMap<String, Translation>,
    /// A new upload; `None` leaves any existing attachment alone
    #[serde(default)]
    pub attachment: Option<AttachmentUpload>,
    /// Clear the current attachment when no new one is uploaded
    #[serde(default)]
    pub delete_attachment: bool,
}

impl ContentForm {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn translation(mut self, locale: &str, title: Option<&str>, body: Option<&str>) -> Self {
        self.translations
            .insert(locale.to_string(), Translation::new(title, body));
        self
    }

    pub fn attachment(mut self, upload: AttachmentUpload) -> Self {
        self.attachment = Some(upload);
        self
    }

    /// Collect every violation in the submission.
    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        errors.require("title", Some(&self.title));

        for tag in self.translations.keys() {
            if !locale::is_valid_tag(tag) {
                errors.add("translations", format!("{tag:?} is not a valid locale"));
            }
        }

        if let Some(upload) = &self.attachment {
            if upload.sanitized_file_name().is_none() {
                errors.add("attachment", "has an invalid file name");
            }
        }

        if let Some(position) = self.position {
            if !position_in_range(position) {
                errors.add("position", POSITION_RANGE);
            }
        }

        errors.into_result()
    }
}

/// Largest position a form or a reorder may assign
pub const MAX_POSITION: i64 = i32::MAX as i64;

pub(crate) const POSITION_RANGE: &str = "must be between 0 and 2147483647";

pub(crate) fn position_in_range(position: i64) -> bool {
    (0..=MAX_POSITION).contains(&position)
}

/// Trimmed-empty strings count as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Normalize an optional form field: blank input is stored as NULL.
pub(crate) fn blank_to_none(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn sample_content() -> Content {
        let mut translations = BTreeMap::new();
        translations.insert("fr".to_string(), Translation::new(Some("Y"), Some("  ")));
        translations.insert("de".to_string(), Translation::new(None, Some("Hallo")));
        Content {
            id: 1,
            page_id: 1,
            title: "X".to_string(),
            body: Some("base body".to_string()),
            context: Some("main".to_string()),
            link_url: None,
            link_text: None,
            hide_title: false,
            position: 0,
            attachment: None,
            translations,
        }
    }

    #[test]
    fn test_per_field_fallback() {
        let content = sample_content();

        let fr = content.localized("fr");
        assert_eq!(fr.title, "Y");
        assert_eq!(fr.body.as_deref(), Some("base body"));

        let de = content.localized("de");
        assert_eq!(de.title, "X");
        assert_eq!(de.body.as_deref(), Some("Hallo"));

        let en = content.localized("en");
        assert_eq!(en.title, "X");
        assert_eq!(en.locale, "en");
    }

    #[test]
    fn test_form_validation_collects_everything() {
        let form = ContentForm::new("")
            .translation("not a locale", Some("x"), None)
            .position(-1)
            .attachment(AttachmentUpload::new("../", None, vec![1]));

        match form.validate() {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.count(), 4);
                assert_eq!(errors.fields(), vec!["title", "translations", "attachment", "position"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_position_bounds() {
        assert!(ContentForm::new("x").position(0).validate().is_ok());
        assert!(ContentForm::new("x").position(MAX_POSITION).validate().is_ok());

        match ContentForm::new("x").position(i64::MAX).validate() {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.on("position"), vec![POSITION_RANGE]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_attachment_meta() {
        let upload = AttachmentUpload::new("C:\\photos\\sample.png", Some("image/png"), vec![1, 2, 3]);
        let meta = upload.meta().unwrap();
        assert_eq!(meta.file_name, "sample.png");
        assert_eq!(meta.content_type, "image/png");
        assert_eq!(meta.file_size, 3);
        assert_eq!(meta.fingerprint, blake3::hash(&[1, 2, 3]).to_hex().to_string());

        let untyped = AttachmentUpload::new("notes.bin", None, Vec::new());
        assert_eq!(untyped.meta().unwrap().content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_form_json_with_base64_attachment() {
        let json = r#"{
            "title": "Just some content",
            "translations": {"fr": {"title": "Juste quelque contenu"}},
            "attachment": {"file_name": "a.txt", "data": "aGVsbG8="}
        }"#;
        let form: ContentForm = serde_json::from_str(json).unwrap();
        assert_eq!(form.attachment.unwrap().data, b"hello".to_vec());
        assert!(!form.delete_attachment);
        assert_eq!(form.translations["fr"].body, None);
    }
}
