//! SQLite storage implementation

use std::collections::BTreeMap;
use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::{debug, info};

use super::schema;
use crate::content::{AttachmentMeta, Content, Translation, blank_to_none};
use crate::page::{NewPage, Page};
use crate::{Error, Result};

const CONTENT_COLUMNS: &str = "id, page_id, title, body, context, link_url, link_text, hide_title, position, \
     attachment_file_name, attachment_content_type, attachment_file_size, attachment_fingerprint";

/// SQLite-backed storage for pages and their contents.
///
/// A single connection sits behind a mutex. Every read and every write runs
/// entirely under the lock, and writes additionally run inside a SQLite
/// transaction, so a multi-row write is never visible half-applied.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Scalar columns written by create and update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRow {
    pub page_id: i64,
    pub title: String,
    pub body: Option<String>,
    pub context: Option<String>,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    pub hide_title: bool,
    pub position: i64,
}

/// What an update does to the stored attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentChange {
    /// Leave whatever is stored untouched
    Keep,
    Replace { meta: AttachmentMeta, data: Vec<u8> },
    Clear,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::initialize_schema(&conn)?;
        info!("Opened database at {:?}", path);
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Initialize the database schema
    fn initialize_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(schema::PRAGMAS)?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Run `f` against the connection while holding the lock.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run `f` inside a transaction; any error rolls the whole unit back.
    pub fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    // ========== Page Operations ==========

    /// Insert a page; the path must not be taken yet
    pub fn insert_page(&self, page: &NewPage) -> Result<Page> {
        page.validate()?;
        let stored = self.write(|tx| {
            if page_by_path(tx, &page.path)?.is_some() {
                return Err(Error::DuplicatePath(page.path.clone()));
            }
            tx.execute(
                "INSERT INTO pages (title, path) VALUES (?1, ?2)",
                params![page.title, page.path],
            )?;
            Ok(Page {
                id: tx.last_insert_rowid(),
                title: page.title.clone(),
                path: page.path.clone(),
            })
        })?;
        info!(page_id = stored.id, path = %stored.path, "Page created");
        Ok(stored)
    }

    /// Get a page by id
    pub fn get_page(&self, id: i64) -> Result<Option<Page>> {
        self.read(|conn| page_by_id(conn, id))
    }

    /// Find the page stored under exactly `path`
    pub fn find_page_by_path(&self, path: &str) -> Result<Option<Page>> {
        self.read(|conn| page_by_path(conn, path))
    }

    /// All pages ordered by path
    pub fn list_pages(&self) -> Result<Vec<Page>> {
        self.read(|conn| {
            let mut stmt = conn.prepare("SELECT id, title, path FROM pages ORDER BY path")?;
            let pages = stmt
                .query_map([], row_to_page)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(pages)
        })
    }

    // ========== Counting ==========

    fn count(&self, sql: &str) -> Result<usize> {
        self.read(|conn| {
            let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    pub fn count_pages(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM pages")
    }

    pub fn count_contents(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM contents")
    }

    pub fn count_translations(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM content_translations")
    }

    pub fn count_attachments(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM contents WHERE attachment_file_name IS NOT NULL")
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            pages: self.count_pages()?,
            contents: self.count_contents()?,
            translations: self.count_translations()?,
            attachments: self.count_attachments()?,
        })
    }
}

// ========== Page Queries ==========

pub(crate) fn page_by_id(conn: &Connection, id: i64) -> Result<Option<Page>> {
    conn.query_row(
        "SELECT id, title, path FROM pages WHERE id = ?1",
        [id],
        row_to_page,
    )
    .optional()
    .map_err(Into::into)
}

pub(crate) fn page_by_path(conn: &Connection, path: &str) -> Result<Option<Page>> {
    debug!(path, "Looking up page by path");
    conn.query_row(
        "SELECT id, title, path FROM pages WHERE path = ?1",
        [path],
        row_to_page,
    )
    .optional()
    .map_err(Into::into)
}

fn row_to_page(row: &rusqlite::Row) -> rusqlite::Result<Page> {
    Ok(Page {
        id: row.get(0)?,
        title: row.get(1)?,
        path: row.get(2)?,
    })
}

// ========== Content Queries ==========

/// Position right after the current last content of a page (0 when empty)
pub(crate) fn next_position(conn: &Connection, page_id: i64) -> Result<i64> {
    let next: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM contents WHERE page_id = ?1",
        [page_id],
        |row| row.get(0),
    )?;
    Ok(next)
}

/// Next value of the write counter used to break position ties
pub(crate) fn next_revision(conn: &Connection) -> Result<i64> {
    let next: i64 = conn.query_row(
        "SELECT COALESCE(MAX(revision), 0) + 1 FROM contents",
        [],
        |row| row.get(0),
    )?;
    Ok(next)
}

/// Owning page of a content, if the content exists
pub(crate) fn content_page_id(conn: &Connection, id: i64) -> Result<Option<i64>> {
    conn.query_row("SELECT page_id FROM contents WHERE id = ?1", [id], |row| row.get(0))
        .optional()
        .map_err(Into::into)
}

pub(crate) fn insert_content(conn: &Connection, row: &ContentRow, revision: i64) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO contents (page_id, title, body, context, link_url, link_text, hide_title, position, revision)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            row.page_id,
            row.title,
            row.body,
            row.context,
            row.link_url,
            row.link_text,
            row.hide_title,
            row.position,
            revision,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn update_content(conn: &Connection, id: i64, row: &ContentRow, revision: i64) -> Result<()> {
    conn.execute(
        r#"
        UPDATE contents
        SET page_id = ?2, title = ?3, body = ?4, context = ?5, link_url = ?6,
            link_text = ?7, hide_title = ?8, position = ?9, revision = ?10
        WHERE id = ?1
        "#,
        params![
            id,
            row.page_id,
            row.title,
            row.body,
            row.context,
            row.link_url,
            row.link_text,
            row.hide_title,
            row.position,
            revision,
        ],
    )?;
    Ok(())
}

pub(crate) fn apply_attachment(conn: &Connection, id: i64, change: &AttachmentChange) -> Result<()> {
    match change {
        AttachmentChange::Keep => {}
        AttachmentChange::Replace { meta, data } => {
            conn.execute(
                r#"
                UPDATE contents
                SET attachment_file_name = ?2, attachment_content_type = ?3,
                    attachment_file_size = ?4, attachment_fingerprint = ?5, attachment_data = ?6
                WHERE id = ?1
                "#,
                params![id, meta.file_name, meta.content_type, meta.file_size, meta.fingerprint, data],
            )?;
        }
        AttachmentChange::Clear => {
            conn.execute(
                r#"
                UPDATE contents
                SET attachment_file_name = NULL, attachment_content_type = NULL,
                    attachment_file_size = NULL, attachment_fingerprint = NULL, attachment_data = NULL
                WHERE id = ?1
                "#,
                [id],
            )?;
        }
    }
    Ok(())
}

/// Upsert the supplied locales; a blank translation removes its locale.
pub(crate) fn save_translations(
    conn: &Connection,
    id: i64,
    translations: &BTreeMap<String, Translation>,
) -> Result<()> {
    for (locale, translation) in translations {
        if translation.is_blank() {
            conn.execute(
                "DELETE FROM content_translations WHERE content_id = ?1 AND locale = ?2",
                params![id, locale],
            )?;
        } else {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO content_translations (content_id, locale, title, body)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    id,
                    locale,
                    blank_to_none(translation.title.as_deref()),
                    blank_to_none(translation.body.as_deref()),
                ],
            )?;
        }
    }
    Ok(())
}

pub(crate) fn content_by_id(conn: &Connection, id: i64) -> Result<Option<Content>> {
    let sql = format!("SELECT {CONTENT_COLUMNS} FROM contents WHERE id = ?1");
    let content = conn.query_row(&sql, [id], row_to_content).optional()?;
    let Some(mut content) = content else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT locale, title, body FROM content_translations WHERE content_id = ?1 ORDER BY locale",
    )?;
    let rows = stmt.query_map([id], |row| {
        Ok((row.get::<_, String>(0)?, Translation { title: row.get(1)?, body: row.get(2)? }))
    })?;
    for row in rows {
        let (locale, translation) = row?;
        content.translations.insert(locale, translation);
    }
    Ok(Some(content))
}

/// Contents of a page in render order, with their translations
pub(crate) fn contents_for_page(conn: &Connection, page_id: i64) -> Result<Vec<Content>> {
    let sql = format!(
        "SELECT {CONTENT_COLUMNS} FROM contents WHERE page_id = ?1 ORDER BY position ASC, revision ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut contents = stmt
        .query_map([page_id], row_to_content)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        r#"
        SELECT t.content_id, t.locale, t.title, t.body
        FROM content_translations t
        JOIN contents c ON c.id = t.content_id
        WHERE c.page_id = ?1
        "#,
    )?;
    let rows = stmt.query_map([page_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            Translation { title: row.get(2)?, body: row.get(3)? },
        ))
    })?;
    let mut by_content: BTreeMap<i64, BTreeMap<String, Translation>> = BTreeMap::new();
    for row in rows {
        let (content_id, locale, translation) = row?;
        by_content.entry(content_id).or_default().insert(locale, translation);
    }
    for content in &mut contents {
        if let Some(translations) = by_content.remove(&content.id) {
            content.translations = translations;
        }
    }
    Ok(contents)
}

/// Returns false when nothing was deleted
pub(crate) fn delete_content(conn: &Connection, id: i64) -> Result<bool> {
    conn.execute("DELETE FROM content_translations WHERE content_id = ?1", [id])?;
    let deleted = conn.execute("DELETE FROM contents WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

/// Move one content of `page_id`; returns false if it is not on that page
pub(crate) fn set_position(
    conn: &Connection,
    id: i64,
    page_id: i64,
    position: i64,
    revision: i64,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE contents SET position = ?3, revision = ?4 WHERE id = ?1 AND page_id = ?2",
        params![id, page_id, position, revision],
    )?;
    Ok(updated == 1)
}

/// Stored attachment bytes, `None` when the content has no attachment
pub(crate) fn attachment_blob(conn: &Connection, id: i64) -> Result<Option<(AttachmentMeta, Vec<u8>)>> {
    let row = conn
        .query_row(
            r#"
            SELECT attachment_file_name, attachment_content_type, attachment_file_size,
                   attachment_fingerprint, attachment_data
            FROM contents WHERE id = ?1
            "#,
            [id],
            |row| {
                let file_name: Option<String> = row.get(0)?;
                let Some(file_name) = file_name else {
                    return Ok(None);
                };
                let meta = AttachmentMeta {
                    file_name,
                    content_type: row.get(1)?,
                    file_size: row.get(2)?,
                    fingerprint: row.get(3)?,
                };
                let data: Option<Vec<u8>> = row.get(4)?;
                Ok(Some((meta, data.unwrap_or_default())))
            },
        )
        .optional()?;
    Ok(row.flatten())
}

/// Helper to convert a row to a Content (translations are filled in separately)
fn row_to_content(row: &rusqlite::Row) -> rusqlite::Result<Content> {
    let file_name: Option<String> = row.get(9)?;
    let attachment = match file_name {
        Some(file_name) => Some(AttachmentMeta {
            file_name,
            content_type: row.get(10)?,
            file_size: row.get(11)?,
            fingerprint: row.get(12)?,
        }),
        None => None,
    };

    Ok(Content {
        id: row.get(0)?,
        page_id: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        context: row.get(4)?,
        link_url: row.get(5)?,
        link_text: row.get(6)?,
        hide_title: row.get(7)?,
        position: row.get(8)?,
        attachment,
        translations: BTreeMap::new(),
    })
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub pages: usize,
    pub contents: usize,
    pub translations: usize,
    pub attachments: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Pages: {}", self.pages)?;
        writeln!(f, "  Contents: {}", self.contents)?;
        writeln!(f, "  Translations: {}", self.translations)?;
        writeln!(f, "  Attachments: {}", self.attachments)
    }
}
