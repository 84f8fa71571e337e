use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::locale::{DEFAULT_LOCALE, LocaleSettings};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PagecmsConfig {
    pub database: Option<String>,
    pub port: Option<u16>,
    pub default_locale: Option<String>,
    pub locales: Option<Vec<String>>,
}

impl PagecmsConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn database_path(&self, base: &Path) -> PathBuf {
        match &self.database {
            Some(db) => base.join(db),
            None => default_database_path_in(base),
        }
    }

    pub fn locale_settings(&self) -> crate::Result<LocaleSettings> {
        let default = self.default_locale.as_deref().unwrap_or(DEFAULT_LOCALE);
        let supported = self.locales.clone().unwrap_or_default();
        LocaleSettings::new(default, &supported)
            .map_err(|e| crate::Error::Config(e.to_string()))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("pagecms.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".pagecms").join("pagecms.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<PagecmsConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: PagecmsConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &PagecmsConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagecms.toml");
        let config = PagecmsConfig {
            database: Some("site.db".to_string()),
            port: Some(8080),
            default_locale: Some("en".to_string()),
            locales: Some(vec!["fr".to_string()]),
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.port(), 8080);
        assert_eq!(loaded.database_path(dir.path()), dir.path().join("site.db"));
        assert_eq!(
            loaded.locale_settings().unwrap().supported,
            vec!["en".to_string(), "fr".to_string()]
        );
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.toml"))).unwrap().is_none());

        let config = PagecmsConfig::default();
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.database_path(dir.path()), dir.path().join(".pagecms").join("pagecms.db"));
        assert_eq!(config.locale_settings().unwrap(), LocaleSettings::default());

        let bad = PagecmsConfig {
            default_locale: Some("not a locale".to_string()),
            ..PagecmsConfig::default()
        };
        assert!(matches!(bad.locale_settings(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("pagecms.db");
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }
}
