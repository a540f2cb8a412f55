use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{NoteError, Result};

/// Name of the single record holding the whole store.
pub const DEFAULT_STORE_FILE: &str = "note-store.json";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the store record
    pub data_dir: PathBuf,

    /// File name of the store record inside `data_dir`
    pub store_file: String,

    /// Default directory for exported notes and archives
    pub export_dir: PathBuf,

    /// Editor command used by `edit --edit`
    pub editor_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let (data_dir, export_dir) = match ProjectDirs::from("", "", "sagenote") {
            Some(dirs) => (
                dirs.data_dir().to_path_buf(),
                dirs.data_dir().join("exports"),
            ),
            None => (PathBuf::from(".sagenote"), PathBuf::from("exports")),
        };

        Config {
            data_dir,
            store_file: DEFAULT_STORE_FILE.to_string(),
            export_dir,
            editor_command: None,
        }
    }
}

impl Config {
    /// Default location of the config file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "sagenote").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads the config from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Config::default()),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(NoteError::ConfigError {
                    message: format!("Config file not found: {}", path.display()),
                });
            }
            debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&content).map_err(|e| NoteError::ConfigError {
            message: format!("Invalid config {}: {}", path.display(), e),
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Full path of the store record.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file)
    }

    // This method provides smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        // First try the configured editor
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        // Then try environment variable
        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        // Fall back to platform defaults
        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -t".to_string()
        } else {
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}
