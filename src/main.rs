//! pagecms CLI - administer pages and content blocks, or serve them over HTTP

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pagecms::config::{self, PagecmsConfig};
use pagecms::storage::SqliteStore;
use pagecms::ui::{self, Icons};
use pagecms::{AttachmentUpload, ContentForm, ContentStore, Error, NewPage, PageResolver};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pagecms")]
#[command(version)]
#[command(about = "Path-addressed pages with ordered, localizable content blocks")]
#[command(long_about = r#"
pagecms stores storefront pages addressed by URL path, and the ordered,
localizable content blocks shown on them.

Example usage:
  pagecms init
  pagecms add-page --title "About" --path /about-us
  pagecms add-content --page-id 1 --title "Our story" --translation "fr:Notre histoire:"
  pagecms reorder --page-id 1 3=0 2=1
  pagecms serve --port 3000
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default pagecms.toml and create the database directory
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Serve pages and the admin API over HTTP
    Serve {
        /// Port to listen on (defaults to the config, then 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Create a page
    AddPage {
        #[arg(short, long)]
        title: String,

        /// Exact URL path, e.g. /about-us/services
        #[arg(short, long)]
        path: String,

        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// List all pages
    Pages {
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Resolve a request path (optionally locale-prefixed) to a page
    Resolve {
        path: String,

        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the contents of a page in render order
    Contents {
        #[arg(long)]
        page_id: i64,

        /// Locale to resolve titles and bodies in
        #[arg(short, long)]
        locale: Option<String>,

        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Create a content block on a page
    AddContent {
        #[arg(long)]
        page_id: i64,

        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        body: Option<String>,

        #[arg(long)]
        context: Option<String>,

        /// Defaults to after the last content of the page
        #[arg(long)]
        position: Option<i64>,

        #[arg(long)]
        link_url: Option<String>,

        #[arg(long)]
        link_text: Option<String>,

        #[arg(long)]
        hide_title: bool,

        /// File to attach
        #[arg(short, long)]
        attachment: Option<PathBuf>,

        /// Locale variant as locale:title:body (repeatable)
        #[arg(long)]
        translation: Vec<String>,

        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Delete a content block
    RemoveContent {
        #[arg(long)]
        id: i64,

        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Reassign positions of a page's contents in one step
    Reorder {
        #[arg(long)]
        page_id: i64,

        /// Pairs of content_id=position
        #[arg(required = true)]
        positions: Vec<String>,

        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show statistics about the database
    Stats {
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

fn open_store(database: Option<PathBuf>, config: &PagecmsConfig) -> anyhow::Result<(SqliteStore, PathBuf)> {
    let path = match database {
        Some(path) => path,
        None => config.database_path(Path::new(".")),
    };
    config::ensure_db_dir(&path)?;
    let store = SqliteStore::open(&path)?;
    Ok((store, path))
}

fn parse_translation(raw: &str) -> anyhow::Result<(String, Option<String>, Option<String>)> {
    let mut parts = raw.splitn(3, ':');
    let locale = parts.next().unwrap_or_default().trim().to_string();
    if locale.is_empty() {
        anyhow::bail!("translation {raw:?} must look like locale:title:body");
    }
    let title = parts.next().map(str::to_string);
    let body = parts.next().map(str::to_string);
    Ok((locale, title, body))
}

fn parse_positions(raw: &[String]) -> anyhow::Result<BTreeMap<i64, i64>> {
    let mut positions = BTreeMap::new();
    for pair in raw.iter().flat_map(|s| s.split(',')) {
        let Some((id, position)) = pair.split_once('=') else {
            anyhow::bail!("position {pair:?} must look like content_id=position");
        };
        positions.insert(id.trim().parse()?, position.trim().parse()?);
    }
    Ok(positions)
}

fn report_validation(err: &Error) {
    if let Error::Validation(errors) = err {
        ui::error(&errors.summary());
        for message in errors.full_messages() {
            ui::summary_row("-", &message);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.clone().unwrap_or_else(config::default_config_path);
            let defaults = PagecmsConfig {
                database: Some(".pagecms/pagecms.db".to_string()),
                port: Some(config::DEFAULT_PORT),
                default_locale: Some(pagecms::locale::DEFAULT_LOCALE.to_string()),
                locales: Some(vec![pagecms::locale::DEFAULT_LOCALE.to_string()]),
            };
            config::write_config(&path, &defaults, force)?;
            config::ensure_db_dir(&defaults.database_path(Path::new(".")))?;
            ui::success(&format!("Wrote {}", path.display()));
        }

        Commands::Serve { port, database } => {
            let locales = config.locale_settings()?;
            let (store, path) = open_store(database, &config)?;
            let port = port.unwrap_or_else(|| config.port());

            ui::header("Starting pagecms");
            ui::info(Icons::DATABASE, "Database", &path.display().to_string());
            ui::info(Icons::GLOBE, "Locales", &locales.supported.join(", "));
            ui::info(Icons::ROCKET, "Listening", &format!("http://0.0.0.0:{port}"));

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(pagecms::server::start_server(port, store, locales))?;
        }

        Commands::AddPage { title, path, database } => {
            let (store, _) = open_store(database, &config)?;
            match store.insert_page(&NewPage::new(title, path)) {
                Ok(page) => ui::success(&format!("Created page {} at {}", page.id, page.path)),
                Err(err) => {
                    report_validation(&err);
                    return Err(err.into());
                }
            }
        }

        Commands::Pages { database } => {
            let (store, _) = open_store(database, &config)?;
            let pages = store.list_pages()?;
            if pages.is_empty() {
                ui::warn("No pages yet.");
            } else {
                println!("{}", ui::pages_table(&pages));
            }
        }

        Commands::Resolve { path, database, format } => {
            let locales = config.locale_settings()?;
            let (store, _) = open_store(database, &config)?;
            let resolved = PageResolver::new(&store).resolve_request(&path, &locales)?;
            let contents = ContentStore::new(&store).list(resolved.page.id, &resolved.locale)?;

            if format == "json" {
                let payload = serde_json::json!({
                    "page": resolved.page,
                    "locale": resolved.locale,
                    "contents": contents,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                ui::info(Icons::PAGE, "Page", &format!("{} ({})", resolved.page.title, resolved.page.path));
                ui::info(Icons::GLOBE, "Locale", &resolved.locale);
                if !contents.is_empty() {
                    println!("{}", ui::contents_table(&contents));
                }
            }
        }

        Commands::Contents { page_id, locale, database, format } => {
            let locales = config.locale_settings()?;
            let (store, _) = open_store(database, &config)?;
            let locale = match locale {
                Some(tag) => pagecms::locale::parse_tag(&tag)?,
                None => locales.default.clone(),
            };
            let contents = ContentStore::new(&store).list(page_id, &locale)?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&contents)?);
            } else if contents.is_empty() {
                ui::warn("No contents on this page.");
            } else {
                println!("{}", ui::contents_table(&contents));
            }
        }

        Commands::AddContent {
            page_id,
            title,
            body,
            context,
            position,
            link_url,
            link_text,
            hide_title,
            attachment,
            translation,
            database,
        } => {
            let (store, _) = open_store(database, &config)?;

            let mut form = ContentForm::new(title);
            form.body = body;
            form.context = context;
            form.position = position;
            form.link_url = link_url;
            form.link_text = link_text;
            form.hide_title = hide_title;
            for raw in &translation {
                let (locale, title, body) = parse_translation(raw)?;
                form = form.translation(&locale, title.as_deref(), body.as_deref());
            }
            if let Some(file) = attachment {
                let data = std::fs::read(&file)?;
                form = form.attachment(AttachmentUpload::new(file.to_string_lossy(), None, data));
            }

            match ContentStore::new(&store).create(page_id, &form) {
                Ok(content) => ui::success(&format!(
                    "Created content {} at position {}",
                    content.id, content.position
                )),
                Err(err) => {
                    report_validation(&err);
                    return Err(err.into());
                }
            }
        }

        Commands::RemoveContent { id, database } => {
            let (store, _) = open_store(database, &config)?;
            ContentStore::new(&store).destroy(id)?;
            ui::info(Icons::TRASH, "Removed content", &id.to_string());
        }

        Commands::Reorder { page_id, positions, database } => {
            let (store, _) = open_store(database, &config)?;
            let positions = parse_positions(&positions)?;
            ContentStore::new(&store).reorder(page_id, &positions)?;
            ui::info(Icons::SORT, "Reordered contents", &positions.len().to_string());
        }

        Commands::Stats { database } => {
            let (store, path) = open_store(database, &config)?;
            let stats = store.stats()?;

            ui::section(&format!("{} pagecms statistics ({})", Icons::STATS, path.display()));
            println!(
                "{}",
                ui::stats_table(&[
                    ("Pages", stats.pages.to_string()),
                    ("Contents", stats.contents.to_string()),
                    ("Translations", stats.translations.to_string()),
                    ("Attachments", stats.attachments.to_string()),
                ])
            );
        }
    }

    Ok(())
}
