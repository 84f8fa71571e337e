//! Content Store - CRUD, reordering and localization of content blocks
//!
//! Every operation validates first and only then touches the database.
//! Writes run as one transaction each (see [`SqliteStore::write`]), so a
//! create with translations and an attachment, or a bulk reorder, is either
//! fully visible or not at all.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::content::{
    AttachmentMeta, Content, ContentForm, LocalizedContent, POSITION_RANGE, blank_to_none,
    position_in_range,
};
use crate::storage::sqlite::{self, AttachmentChange, ContentRow};
use crate::storage::SqliteStore;
use crate::validation::ValidationErrors;
use crate::{Error, Result};

pub struct ContentStore<'a> {
    store: &'a SqliteStore,
}

impl<'a> ContentStore<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Create a content block on `page_id` (or on `form.page_id` when set).
    ///
    /// Without an explicit position the block is appended after the page's
    /// current last block.
    pub fn create(&self, page_id: i64, form: &ContentForm) -> Result<Content> {
        form.validate()?;
        let attachment = upload_change(form)?;
        let target = form.page_id.unwrap_or(page_id);

        let content = self.store.write(|tx| {
            if sqlite::page_by_id(tx, target)?.is_none() {
                return Err(Error::PageMissing(target));
            }
            let position = match form.position {
                Some(position) => position,
                None => sqlite::next_position(tx, target)?,
            };
            let row = content_row(form, target, position);
            let id = sqlite::insert_content(tx, &row, sqlite::next_revision(tx)?)?;
            sqlite::apply_attachment(tx, id, &attachment)?;
            sqlite::save_translations(tx, id, &form.translations)?;
            sqlite::content_by_id(tx, id)?.ok_or(Error::ContentNotFound(id))
        })?;

        info!(content_id = content.id, page_id = content.page_id, position = content.position, "Content created");
        Ok(content)
    }

    /// Update a content block from a full form submission.
    ///
    /// The attachment is replaced only by a new upload and cleared only when
    /// `delete_attachment` is set; a form without either leaves it as is.
    /// Base fields are replaced wholesale, so an omitted body is cleared.
    pub fn update(&self, content_id: i64, form: &ContentForm) -> Result<Content> {
        form.validate()?;
        let attachment = match upload_change(form)? {
            AttachmentChange::Keep if form.delete_attachment => AttachmentChange::Clear,
            change => change,
        };

        let content = self.store.write(|tx| {
            let current = sqlite::content_by_id(tx, content_id)?
                .ok_or(Error::ContentNotFound(content_id))?;
            let target = form.page_id.unwrap_or(current.page_id);
            let moved = target != current.page_id;
            if moved && sqlite::page_by_id(tx, target)?.is_none() {
                return Err(Error::PageMissing(target));
            }
            let position = match form.position {
                Some(position) => position,
                None if moved => sqlite::next_position(tx, target)?,
                None => current.position,
            };
            let row = content_row(form, target, position);
            sqlite::update_content(tx, content_id, &row, sqlite::next_revision(tx)?)?;
            sqlite::apply_attachment(tx, content_id, &attachment)?;
            sqlite::save_translations(tx, content_id, &form.translations)?;
            sqlite::content_by_id(tx, content_id)?.ok_or(Error::ContentNotFound(content_id))
        })?;

        info!(content_id, page_id = content.page_id, attachment = ?attachment_label(&attachment), "Content updated");
        Ok(content)
    }

    /// Delete a content block and its translations.
    ///
    /// Deleting an id that is already gone reports `ContentNotFound`.
    pub fn destroy(&self, content_id: i64) -> Result<()> {
        let deleted = self.store.write(|tx| sqlite::delete_content(tx, content_id))?;
        if !deleted {
            debug!(content_id, "Destroy of missing content");
            return Err(Error::ContentNotFound(content_id));
        }
        info!(content_id, "Content destroyed");
        Ok(())
    }

    /// Apply a whole `content_id -> position` mapping as one unit.
    ///
    /// Every id must belong to `page_id`; otherwise nothing changes.
    pub fn reorder(&self, page_id: i64, positions: &BTreeMap<i64, i64>) -> Result<()> {
        let mut errors = ValidationErrors::new();
        for (id, position) in positions {
            if !position_in_range(*position) {
                errors.add("positions", format!("position for {id} {POSITION_RANGE}"));
            }
        }
        errors.into_result()?;

        self.store.write(|tx| {
            if sqlite::page_by_id(tx, page_id)?.is_none() {
                return Err(Error::PageMissing(page_id));
            }
            for (&id, &position) in positions {
                let revision = sqlite::next_revision(tx)?;
                if !sqlite::set_position(tx, id, page_id, position, revision)? {
                    return Err(Error::ContentNotFound(id));
                }
            }
            Ok(())
        })?;

        info!(page_id, count = positions.len(), "Content positions updated");
        Ok(())
    }

    /// Contents of a page in render order, localized to `locale`.
    pub fn list(&self, page_id: i64, locale: &str) -> Result<Vec<LocalizedContent>> {
        Ok(self
            .list_all(page_id)?
            .iter()
            .map(|content| content.localized(locale))
            .collect())
    }

    /// Contents of a page in render order with base fields and translations.
    pub fn list_all(&self, page_id: i64) -> Result<Vec<Content>> {
        self.store.read(|conn| {
            if sqlite::page_by_id(conn, page_id)?.is_none() {
                return Err(Error::PageMissing(page_id));
            }
            sqlite::contents_for_page(conn, page_id)
        })
    }

    pub fn get(&self, content_id: i64) -> Result<Content> {
        self.store
            .read(|conn| sqlite::content_by_id(conn, content_id))?
            .ok_or(Error::ContentNotFound(content_id))
    }

    /// Attachment bytes of a content block, `None` when it has no attachment.
    pub fn attachment(&self, content_id: i64) -> Result<Option<(AttachmentMeta, Vec<u8>)>> {
        self.store.read(|conn| {
            if sqlite::content_page_id(conn, content_id)?.is_none() {
                return Err(Error::ContentNotFound(content_id));
            }
            sqlite::attachment_blob(conn, content_id)
        })
    }
}

fn upload_change(form: &ContentForm) -> Result<AttachmentChange> {
    match &form.attachment {
        Some(upload) => Ok(AttachmentChange::Replace {
            meta: upload.meta()?,
            data: upload.data.clone(),
        }),
        None => Ok(AttachmentChange::Keep),
    }
}

fn attachment_label(change: &AttachmentChange) -> &'static str {
    match change {
        AttachmentChange::Keep => "kept",
        AttachmentChange::Replace { .. } => "replaced",
        AttachmentChange::Clear => "cleared",
    }
}

fn content_row(form: &ContentForm, page_id: i64, position: i64) -> ContentRow {
    ContentRow {
        page_id,
        title: form.title.trim().to_string(),
        body: blank_to_none(form.body.as_deref()),
        context: blank_to_none(form.context.as_deref()),
        link_url: blank_to_none(form.link_url.as_deref()),
        link_text: blank_to_none(form.link_text.as_deref()),
        hide_title: form.hide_title,
        position,
    }
}
