//! Shared types for the sagenote application.
//!
//! This module contains the crate-wide Result alias, the category filter and
//! the command-line subcommands.
use std::{fmt, path::PathBuf};

use clap::Subcommand;
use serde::{Deserialize, Serialize};

use crate::NoteError;

/// A specialized Result type for sagenote operations.
pub type Result<T> = std::result::Result<T, NoteError>;

/// Which notes the list view shows by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub const ALL: &'static str = "all";

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => name == category,
        }
    }

    /// Category given to notes created while this filter is active.
    pub fn default_category(&self) -> &str {
        match self {
            CategoryFilter::All => "",
            CategoryFilter::Named(name) => name,
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        if value == CategoryFilter::ALL {
            CategoryFilter::All
        } else {
            CategoryFilter::Named(value)
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        CategoryFilter::from(value.to_string())
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        match value {
            CategoryFilter::All => CategoryFilter::ALL.to_string(),
            CategoryFilter::Named(name) => name,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(CategoryFilter::ALL),
            CategoryFilter::Named(name) => f.write_str(name),
        }
    }
}

/// Available subcommands for the sagenote application
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new note and select it
    New {
        /// Seed the note from a template id (see `template --list`)
        #[clap(short, long)]
        template: Option<String>,

        /// Title of the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Content of the note, can be markdown formatted
        #[clap(short, long)]
        content: Option<String>,
    },

    /// List notes, pinned first then most recently modified
    List {
        /// Filter by text in title or content (overrides the saved search)
        #[clap(short, long)]
        search: Option<String>,

        /// Filter by category, or "all" (overrides the saved filter)
        #[clap(short = 'C', long)]
        category: Option<String>,

        /// Include archived notes
        #[clap(short, long)]
        archived: bool,

        /// Limit the number of notes returned (0 for no limit)
        #[clap(short = 'n', long, default_value_t = 0)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Show a note (defaults to the selected note)
    Show {
        /// ID of the note to show
        id: Option<String>,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,

        /// Render the content as HTML
        #[clap(long)]
        html: bool,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit
        id: String,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content for the note
        #[clap(short, long)]
        content: Option<String>,

        /// Path to a file containing the new note content
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// New category for the note (empty string clears it)
        #[clap(short = 'C', long)]
        category: Option<String>,

        /// Due date, as YYYY-MM-DD or RFC 3339
        #[clap(short, long)]
        due: Option<String>,

        /// Open content in editor before saving
        #[clap(short, long)]
        edit: bool,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Select a note, or clear the selection
    Select {
        /// ID of the note to select
        id: Option<String>,
    },

    /// Pin or unpin a note
    Pin {
        /// ID of the note to toggle
        id: String,
    },

    /// Archive a note (hidden from the default list)
    Archive {
        /// ID of the note to archive
        id: String,
    },

    /// Restore an archived note
    Unarchive {
        /// ID of the note to restore
        id: String,
    },

    /// Tag operations (add, remove)
    Tag {
        /// ID of the note to modify
        id: String,

        /// Tags to add (comma-separated)
        #[clap(short, long)]
        add: Option<String>,

        /// Tags to remove (comma-separated)
        #[clap(short, long)]
        remove: Option<String>,
    },

    /// Todo operations (add, toggle)
    Todo {
        /// ID of the note to modify
        id: String,

        /// Text of a todo to append
        #[clap(short, long)]
        add: Option<String>,

        /// Due date for the added todo, as YYYY-MM-DD or RFC 3339
        #[clap(short, long, requires = "add")]
        due: Option<String>,

        /// ID of a todo whose completion to flip
        #[clap(short, long)]
        toggle: Option<String>,
    },

    /// Attach files to a note
    Attach {
        /// ID of the note to modify
        id: String,

        /// Files or directories to attach
        #[clap(required = true)]
        paths: Vec<PathBuf>,

        /// Only take files matching this glob (e.g. "*.png")
        #[clap(short, long)]
        glob: Option<String>,
    },

    /// Collaborator labels (add, remove)
    Share {
        /// ID of the note to modify
        id: String,

        /// Email to add
        #[clap(short, long)]
        add: Option<String>,

        /// Email to remove
        #[clap(short, long)]
        remove: Option<String>,
    },

    /// Template management
    Template {
        /// Name of a template to add or replace
        #[clap(short, long)]
        add: Option<String>,

        /// Content of the template being added
        #[clap(short, long, requires = "add")]
        content: Option<String>,

        /// Path to a file with the template content
        #[clap(short, long, requires = "add")]
        file: Option<PathBuf>,

        /// List all templates
        #[clap(short, long)]
        list: bool,
    },

    /// Version history (create, list, revert)
    Version {
        /// ID of the note
        id: String,

        /// Checkpoint the current content
        #[clap(short, long)]
        create: bool,

        /// Restore content from this version number
        #[clap(short, long)]
        revert: Option<u32>,
    },

    /// Category management
    Category {
        /// Add a category and filter by it
        #[clap(short, long)]
        add: Option<String>,

        /// Filter the list by this category, or "all"
        #[clap(short, long)]
        select: Option<String>,
    },

    /// Set the saved search term (empty string clears it)
    Search {
        /// Text to look for in titles and content
        term: String,
    },

    /// Toggle preview mode (`show` renders HTML while it is on)
    Preview,

    /// Export a note as a markdown file
    Export {
        /// ID of the note to export
        id: String,

        /// Directory to write into (default uses config setting)
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Write rendered HTML instead of markdown
        #[clap(long)]
        html: bool,
    },

    /// Write every note into a zip archive of markdown files
    Backup {
        /// Path for the archive (default uses config setting)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the current configuration
    Config,
}
