//! Core data structures for the sagenote application.
//!
//! Notes are only mutated through [`NoteStore`](crate::NoteStore), so the
//! fields are private and exposed through accessors. Serialization uses the
//! camelCase shape of the persisted record.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{stats, VersionLedger};

/// Title given to every freshly created note.
pub const DEFAULT_TITLE: &str = "Untitled Note";

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier, derived from the creation time
    id: String,
    title: String,
    /// Raw markdown
    content: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    is_pinned: bool,
    #[serde(default)]
    is_archived: bool,
    #[serde(default)]
    word_count: usize,
    #[serde(default)]
    read_time: usize,
    version: u32,
    #[serde(default)]
    versions: VersionLedger,
    #[serde(default)]
    collaborators: Vec<String>,
    #[serde(default)]
    attachments: Vec<Attachment>,
    #[serde(default)]
    todos: Vec<Todo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,
    /// Id of the template this note was seeded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    last_modified: DateTime<Utc>,
}

/// A checklist item attached to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

/// A file reference attached to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    /// Media type, e.g. `image/png`
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub name: String,
}

/// Attachment fields supplied by the caller; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    pub kind: String,
    pub url: String,
    pub name: String,
}

/// A partial update for [`NoteStore::update_note`](crate::NoteStore::update_note).
///
/// Every `Some` field replaces the corresponding note field. Identity,
/// version history and derived stats are not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    pub collaborators: Option<Vec<String>>,
    /// `Some(None)` clears the due date
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl NotePatch {
    pub fn title(title: impl Into<String>) -> Self {
        NotePatch {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        NotePatch {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn category(category: impl Into<String>) -> Self {
        NotePatch {
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == NotePatch::default()
    }
}

impl Note {
    /// Creates a new note with the given id and seed content.
    pub(crate) fn new(
        id: String,
        content: String,
        category: String,
        template: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut note = Note {
            id,
            title: DEFAULT_TITLE.to_string(),
            content,
            category,
            tags: Vec::new(),
            is_pinned: false,
            is_archived: false,
            word_count: 0,
            read_time: 0,
            version: 1,
            versions: VersionLedger::default(),
            collaborators: Vec::new(),
            attachments: Vec::new(),
            todos: Vec::new(),
            due_date: None,
            template,
            last_modified: now,
        };
        note.refresh_stats();
        note
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn is_pinned(&self) -> bool {
        self.is_pinned
    }

    pub fn is_archived(&self) -> bool {
        self.is_archived
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Estimated read time in minutes
    pub fn read_time(&self) -> usize {
        self.read_time
    }

    /// Current version counter; starts at 1
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn versions(&self) -> &VersionLedger {
        &self.versions
    }

    pub fn collaborators(&self) -> &[String] {
        &self.collaborators
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Applies a patch. Returns true if content changed.
    pub(crate) fn apply(&mut self, patch: NotePatch, now: DateTime<Utc>) -> bool {
        let mut content_changed = false;

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
            content_changed = true;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(tags) = patch.tags {
            self.tags = clean_labels(tags);
        }
        if let Some(pinned) = patch.is_pinned {
            self.is_pinned = pinned;
        }
        if let Some(archived) = patch.is_archived {
            self.is_archived = archived;
        }
        if let Some(collaborators) = patch.collaborators {
            self.collaborators = clean_labels(collaborators);
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }

        if content_changed {
            self.refresh_stats();
        }
        self.touch(now);
        content_changed
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = now;
    }

    pub(crate) fn refresh_stats(&mut self) {
        let stats = stats::compute(&self.content);
        self.word_count = stats.word_count;
        self.read_time = stats.read_time;
    }

    pub(crate) fn toggle_pin(&mut self) {
        self.is_pinned = !self.is_pinned;
    }

    pub(crate) fn set_archived(&mut self, archived: bool) -> bool {
        let changed = self.is_archived != archived;
        self.is_archived = archived;
        changed
    }

    /// Adds a tag unless it is empty or already present. Returns true if
    /// added.
    pub(crate) fn add_tag(&mut self, tag: &str) -> bool {
        insert_label(&mut self.tags, tag)
    }

    pub(crate) fn remove_tag(&mut self, tag: &str) -> bool {
        remove_label(&mut self.tags, tag)
    }

    pub(crate) fn add_collaborator(&mut self, email: &str) -> bool {
        insert_label(&mut self.collaborators, email)
    }

    pub(crate) fn remove_collaborator(&mut self, email: &str) -> bool {
        remove_label(&mut self.collaborators, email)
    }

    pub(crate) fn push_todo(&mut self, todo: Todo) {
        self.todos.push(todo);
    }

    /// Flips a todo's completion flag. Returns false if no todo has that id.
    pub(crate) fn toggle_todo(&mut self, todo_id: &str) -> bool {
        match self.todos.iter_mut().find(|t| t.id == todo_id) {
            Some(todo) => {
                todo.completed = !todo.completed;
                true
            }
            None => false,
        }
    }

    pub(crate) fn push_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Snapshots the current content and bumps the version counter.
    pub(crate) fn checkpoint(&mut self, now: DateTime<Utc>) -> u32 {
        self.version += 1;
        self.versions.record(&self.content, self.version, now);
        self.version
    }

    /// Restores content from a snapshot. Returns false if it does not exist.
    pub(crate) fn revert_to(&mut self, version: u32, now: DateTime<Utc>) -> bool {
        let Some(snapshot) = self.versions.find(version) else {
            return false;
        };
        self.content = snapshot.content().to_string();
        self.refresh_stats();
        self.touch(now);
        true
    }
}

/// Trims a tag or collaborator label. Blank labels give `None`.
pub(crate) fn clean_label(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Cleans every label, dropping blanks and later duplicates.
pub(crate) fn clean_labels(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in &values {
        if let Some(label) = clean_label(value) {
            if !out.iter().any(|v| v == label) {
                out.push(label.to_string());
            }
        }
    }
    out
}

fn insert_label(values: &mut Vec<String>, value: &str) -> bool {
    match clean_label(value) {
        Some(label) if !values.iter().any(|v| v == label) => {
            values.push(label.to_string());
            true
        }
        _ => false,
    }
}

fn remove_label(values: &mut Vec<String>, value: &str) -> bool {
    let Some(label) = clean_label(value) else {
        return false;
    };
    let before = values.len();
    values.retain(|v| v != label);
    values.len() != before
}
