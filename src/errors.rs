//! Error types for the sagenote application.
//!
//! This module defines custom error types that categorize different failures
//! that can occur during note management operations.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the sagenote application.
#[derive(Error, Debug)]
pub enum NoteError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors related to zip operations.
    #[error("Zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// An attachment filter pattern could not be compiled.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// The note exists but has no snapshot with this version number.
    #[error("Version {version} not found for note {id}")]
    VersionNotFound { id: String, version: u32 },

    #[error("Todo {todo_id} not found in note {id}")]
    TodoNotFound { id: String, todo_id: String },

    #[error("Template not found: {id}")]
    TemplateNotFound { id: String },

    /// Invalid note format or content.
    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    /// The durable record rejected a write. In-memory state is still valid.
    #[error("Persistence failed: {message}")]
    PersistenceFailed { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },

    /// file not found
    #[error("File not found: {file_path}")]
    FileNotFound { file_path: String },

    #[error("{message}")]
    EditorError { message: String },
}

impl NoteError {
    /// True for the "id does not resolve" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            NoteError::NoteNotFound { .. }
                | NoteError::VersionNotFound { .. }
                | NoteError::TodoNotFound { .. }
                | NoteError::TemplateNotFound { .. }
        )
    }
}
