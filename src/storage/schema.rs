//! Database schema definitions

/// Connection-level settings applied on every open
pub const PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

/// SQL to create the pages table
pub const CREATE_PAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    path TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the contents table
/// `revision` is bumped on every write and breaks ties between equal positions
pub const CREATE_CONTENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS contents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    body TEXT,
    context TEXT,
    link_url TEXT,
    link_text TEXT,
    hide_title INTEGER NOT NULL DEFAULT 0,
    position INTEGER NOT NULL DEFAULT 0,
    revision INTEGER NOT NULL DEFAULT 0,
    attachment_file_name TEXT,
    attachment_content_type TEXT,
    attachment_file_size INTEGER,
    attachment_fingerprint TEXT,
    attachment_data BLOB
)
"#;

/// SQL to create the per-locale overrides of title and body
pub const CREATE_CONTENT_TRANSLATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS content_translations (
    content_id INTEGER NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
    locale TEXT NOT NULL,
    title TEXT,
    body TEXT,
    PRIMARY KEY (content_id, locale)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_contents_page ON contents(page_id, position, revision)",
    "CREATE INDEX IF NOT EXISTS idx_translations_locale ON content_translations(locale)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_PAGES_TABLE,
        CREATE_CONTENTS_TABLE,
        CREATE_CONTENT_TRANSLATIONS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
