//! Per-test fixture builders. Every call works on the store it is given;
//! nothing is shared between tests.

use crate::content::{AttachmentUpload, Content, ContentForm};
use crate::contents::ContentStore;
use crate::page::{NewPage, Page};
use crate::storage::SqliteStore;

pub(crate) fn store() -> SqliteStore {
    SqliteStore::open_in_memory().unwrap()
}

pub(crate) fn page(store: &SqliteStore, title: &str, path: &str) -> Page {
    store.insert_page(&NewPage::new(title, path)).unwrap()
}

pub(crate) fn content(store: &SqliteStore, page: &Page, title: &str, position: i64) -> Content {
    let form = ContentForm::new(title)
        .body("Just some words in the content...")
        .position(position);
    ContentStore::new(store).create(page.id, &form).unwrap()
}

pub(crate) fn sample_image() -> AttachmentUpload {
    AttachmentUpload::new("sample.png", Some("image/png"), vec![0x89, b'P', b'N', b'G'])
}
