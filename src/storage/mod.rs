//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - pages(id, title, path)
//! - contents(id, page_id, title, body, context, links, position, attachment...)
//! - content_translations(content_id, locale, title, body)

pub mod schema;
pub mod sqlite;

pub use sqlite::{AttachmentChange, ContentRow, DbStats, SqliteStore};
