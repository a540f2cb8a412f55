//! Durable storage for the whole store state.
//!
//! The state is one JSON record, read once at startup and replaced wholesale
//! after every change.
use std::{
    cell::RefCell,
    fs,
    io::Write,
    path::{Path, PathBuf},
    rc::Rc,
};

use log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{builtin_templates, CategoryFilter, NoteError, Note, Result, Template};

/// Everything the store persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreState {
    pub notes: Vec<Note>,
    pub templates: Vec<Template>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub selected_note: Option<String>,
    pub search_term: String,
    pub selected_category: CategoryFilter,
    pub is_preview_mode: bool,
}

impl Default for StoreState {
    fn default() -> Self {
        StoreState {
            notes: Vec::new(),
            templates: builtin_templates(),
            categories: Vec::new(),
            tags: Vec::new(),
            selected_note: None,
            search_term: String::new(),
            selected_category: CategoryFilter::All,
            is_preview_mode: false,
        }
    }
}

/// Where the store state lives between sessions.
pub trait StateBackend {
    /// Reads the saved state. `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> Result<Option<StoreState>>;

    /// Replaces the saved state.
    fn save(&mut self, state: &StoreState) -> Result<()>;

    /// Human-readable location, for log messages.
    fn describe(&self) -> String;
}

/// Stores the state as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBackend { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateBackend for FileBackend {
    fn load(&self) -> Result<Option<StoreState>> {
        if !self.path.exists() {
            info!(
                "No saved state at {}, starting fresh",
                self.path.display()
            );
            return Ok(None);
        }

        debug!("Loading store state from file: {}", self.path.display());
        let content = fs::read_to_string(&self.path).map_err(|e| {
            error!("Failed to open state file {}: {}", self.path.display(), e);
            NoteError::Io(e)
        })?;

        let state: StoreState = serde_json::from_str(&content).map_err(|e| {
            let message = format!("State file {} is unreadable: {}", self.path.display(), e);
            error!("{}", message);
            NoteError::InvalidFormat { message }
        })?;

        if let Some(note) = state.notes.iter().find(|n| n.id().is_empty()) {
            let message = format!(
                "State file {} contains a note with an empty ID (title {:?})",
                self.path.display(),
                note.title()
            );
            error!("{}", message);
            return Err(NoteError::InvalidFormat { message });
        }

        info!("Loaded {} notes from {}", state.notes.len(), self.path.display());
        Ok(Some(state))
    }

    /// Writes through a temporary file in the same directory and renames it
    /// over the old record, so a failed write never leaves a torn file.
    fn save(&mut self, state: &StoreState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {}", parent.display());
                fs::create_dir_all(parent).map_err(|e| {
                    error!("Failed to create directory {}: {}", parent.display(), e);
                    NoteError::DirectoryError {
                        path: parent.to_path_buf(),
                    }
                })?;
            }
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NoteError::Io(e)
        })?;

        trace!("Serializing store state to JSON");
        let json = serde_json::to_string_pretty(state).map_err(|e| {
            error!("Failed to serialize store state: {}", e);
            NoteError::Serialization(e)
        })?;

        temp_file.write_all(json.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            NoteError::Io(e)
        })?;
        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            NoteError::Io(e)
        })?;

        temp_file.persist(&self.path).map_err(|e| {
            error!(
                "Failed to persist file {}: {}",
                self.path.display(),
                e.error
            );
            NoteError::Io(e.error)
        })?;

        debug!("Store state written to {}", self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps the serialized record in memory.
///
/// Clones share the same record, so a second store opened on a clone sees
/// what the first one saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    record: Rc<RefCell<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw JSON last saved, if any.
    pub fn raw(&self) -> Option<String> {
        self.record.borrow().clone()
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self) -> Result<Option<StoreState>> {
        let record = self.record.borrow();
        let Some(json) = record.as_deref() else {
            return Ok(None);
        };
        let state: StoreState = serde_json::from_str(json).map_err(|e| {
            let message = format!("In-memory record is unreadable: {}", e);
            error!("{}", message);
            NoteError::InvalidFormat { message }
        })?;
        Ok(Some(state))
    }

    fn save(&mut self, state: &StoreState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        *self.record.borrow_mut() = Some(json);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory record".to_string()
    }
}
