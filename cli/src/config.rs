use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub bell: bool,
}

/// Optional `config.json`. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    db_path: Option<PathBuf>,
    bell: Option<bool>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "taskman").context("Could not determine home directory")?;
        Self::from_dirs(proj_dirs.data_dir(), proj_dirs.config_dir())
    }

    /// Resolve paths under `data_dir`, layering `config_dir/config.json` on top.
    pub fn from_dirs(data_dir: &Path, config_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let file = read_file_config(&config_dir.join(CONFIG_FILE))?;

        let db_path = file
            .db_path
            .unwrap_or_else(|| data_dir.join("taskman.db"));

        Ok(Config {
            db_path,
            data_dir: data_dir.to_path_buf(),
            bell: file.bell.unwrap_or(true),
        })
    }

    /// Apply command-line overrides, which win over the config file.
    #[must_use]
    pub fn with_overrides(mut self, db: Option<PathBuf>, quiet_bell: bool) -> Self {
        if let Some(db) = db {
            self.db_path = db;
        }
        if quiet_bell {
            self.bell = false;
        }
        self
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let data = tmp.path().join("data");
        let config = Config::from_dirs(&data, &tmp.path().join("config")).unwrap();

        assert!(data.is_dir());
        assert_eq!(config.db_path, data.join("taskman.db"));
        assert!(config.bell);
    }

    #[test]
    fn test_config_file_values() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config_dir = tmp.path().join("config");
        std::fs::create_dir_all(&config_dir).unwrap();
        let custom_db = tmp.path().join("elsewhere.db");
        std::fs::write(
            config_dir.join(CONFIG_FILE),
            serde_json::json!({ "db_path": custom_db, "bell": false }).to_string(),
        )
        .unwrap();

        let config = Config::from_dirs(&tmp.path().join("data"), &config_dir).unwrap();
        assert_eq!(config.db_path, custom_db);
        assert!(!config.bell);
    }

    #[test]
    fn test_config_file_rejects_unknown_keys() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), r#"{ "colour": "blue" }"#).unwrap();
        assert!(Config::from_dirs(&tmp.path().join("data"), tmp.path()).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::from_dirs(&tmp.path().join("data"), tmp.path())
            .unwrap()
            .with_overrides(Some(PathBuf::from("/tmp/other.db")), true);
        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert!(!config.bell);
    }
}
