//! The note store: sole owner of notes, templates and view state.
//!
//! Every operation runs to completion, then the whole state is written to the
//! backend and subscribers are notified. Operations that name a missing note,
//! todo, version or template return a not-found error and change nothing.
//! Empty or duplicate tags and collaborators are accepted as no-ops. A failed
//! write never fails the operation: it is logged, kept as
//! [`NoteStore::last_persistence_error`] and broadcast as
//! [`StoreEvent::PersistenceFailed`].
use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use log::{debug, info, trace, warn};

use crate::{
    clock::IdGenerator, note::{clean_label, clean_labels}, Attachment, CategoryFilter, Clock,
    NewAttachment, Note, NoteError, NotePatch, Result, StateBackend, StoreEvent, StoreState,
    SubscriptionId, Subscribers, SystemClock, Template, Todo,
};

/// Pinned notes first, then most recently modified first.
pub fn default_order(a: &Note, b: &Note) -> Ordering {
    b.is_pinned()
        .cmp(&a.is_pinned())
        .then_with(|| b.last_modified().cmp(&a.last_modified()))
}

/// Manages the notes collection and its persistence.
pub struct NoteStore {
    state: StoreState,
    backend: Box<dyn StateBackend>,
    clock: Box<dyn Clock>,
    ids: IdGenerator,
    subscribers: Subscribers,
    last_persistence_error: Option<String>,
}

impl NoteStore {
    /// Opens the store on a backend, loading any saved state.
    pub fn open(backend: impl StateBackend + 'static) -> Result<Self> {
        Self::open_with_clock(backend, SystemClock)
    }

    /// Like [`NoteStore::open`], reading time from the given clock.
    pub fn open_with_clock(
        backend: impl StateBackend + 'static,
        clock: impl Clock + 'static,
    ) -> Result<Self> {
        info!("Opening note store at {}", backend.describe());

        let mut state = backend.load()?.unwrap_or_default();

        // Derived fields are never trusted from disk.
        for note in state.notes.iter_mut() {
            note.refresh_stats();
        }

        if let Some(selected) = state.selected_note.as_deref() {
            if !state.notes.iter().any(|n| n.id() == selected) {
                warn!("Saved selection {} no longer exists, clearing it", selected);
                state.selected_note = None;
            }
        }

        let ids = IdGenerator::resume_after(state.notes.iter().flat_map(|note| {
            std::iter::once(note.id())
                .chain(note.todos().iter().map(|t| t.id.as_str()))
                .chain(note.attachments().iter().map(|a| a.id.as_str()))
        }));

        debug!(
            "Store opened with {} notes and {} templates",
            state.notes.len(),
            state.templates.len()
        );

        Ok(NoteStore {
            state,
            backend: Box::new(backend),
            clock: Box::new(clock),
            ids,
            subscribers: Subscribers::default(),
            last_persistence_error: None,
        })
    }

    /// Registers a callback invoked after every change.
    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // ----- reads -----

    /// Notes in collection order (newest created first).
    pub fn notes(&self) -> &[Note] {
        &self.state.notes
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.state.notes.iter().find(|n| n.id() == id)
    }

    pub fn templates(&self) -> &[Template] {
        &self.state.templates
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.state.templates.iter().find(|t| t.id == id)
    }

    pub fn categories(&self) -> &[String] {
        &self.state.categories
    }

    /// Every tag ever added to a note.
    pub fn tags(&self) -> &[String] {
        &self.state.tags
    }

    pub fn selected_note_id(&self) -> Option<&str> {
        self.state.selected_note.as_deref()
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.selected_note_id().and_then(|id| self.note(id))
    }

    pub fn search_term(&self) -> &str {
        &self.state.search_term
    }

    pub fn selected_category(&self) -> &CategoryFilter {
        &self.state.selected_category
    }

    pub fn is_preview_mode(&self) -> bool {
        self.state.is_preview_mode
    }

    /// The error from the most recent failed write, cleared by the next
    /// successful one.
    pub fn last_persistence_error(&self) -> Option<&str> {
        self.last_persistence_error.as_deref()
    }

    /// The full state as it is persisted.
    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// All notes in default order.
    pub fn sorted_notes(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.state.notes.iter().collect();
        notes.sort_by(|a, b| default_order(a, b));
        notes
    }

    /// Default order, narrowed by the saved search term and category filter.
    pub fn filtered_notes(&self) -> Vec<&Note> {
        self.query_notes(&self.state.search_term, &self.state.selected_category)
    }

    /// Default order, narrowed by a case-insensitive search over title and
    /// content and by category.
    pub fn query_notes(&self, search: &str, category: &CategoryFilter) -> Vec<&Note> {
        let needle = search.to_lowercase();
        self.sorted_notes()
            .into_iter()
            .filter(|note| {
                needle.is_empty()
                    || note.title().to_lowercase().contains(&needle)
                    || note.content().to_lowercase().contains(&needle)
            })
            .filter(|note| category.matches(note.category()))
            .collect()
    }

    // ----- note lifecycle -----

    /// Creates a note, prepends it and selects it. Returns the new id.
    pub fn create_note(&mut self, template_id: Option<&str>) -> Result<String> {
        let content = match template_id {
            Some(tid) => self
                .template(tid)
                .map(|t| t.content.clone())
                .ok_or_else(|| NoteError::TemplateNotFound { id: tid.to_string() })?,
            None => String::new(),
        };

        let now = self.clock.now();
        let id = self.ids.next(now);
        let category = self.state.selected_category.default_category().to_string();
        let note = Note::new(
            id.clone(),
            content,
            category,
            template_id.map(str::to_string),
            now,
        );

        info!("Creating note {} (template: {:?})", id, template_id);
        self.state.notes.insert(0, note);
        self.state.selected_note = Some(id.clone());
        self.commit(StoreEvent::NoteCreated { id: id.clone() });
        Ok(id)
    }

    /// Applies a partial update and refreshes the modification time.
    pub fn update_note(&mut self, id: &str, patch: NotePatch) -> Result<()> {
        let now = self.clock.now();
        let new_category = patch.category.clone();
        let new_tags = patch.tags.clone();

        let note = self.note_mut(id)?;
        let content_changed = note.apply(patch, now);
        if content_changed {
            trace!(
                "Note {} content now {} words, {} min",
                id,
                note.word_count(),
                note.read_time()
            );
        }

        if let Some(category) = new_category {
            self.register_category(&category);
        }
        for tag in clean_labels(new_tags.unwrap_or_default()) {
            self.register_tag(&tag);
        }

        debug!("Updated note {}", id);
        self.commit(StoreEvent::NoteUpdated { id: id.to_string() });
        Ok(())
    }

    /// Removes a note for good. If it was selected, the selection moves to
    /// the first remaining note in default order.
    pub fn delete_note(&mut self, id: &str) -> Result<()> {
        let index = self
            .state
            .notes
            .iter()
            .position(|n| n.id() == id)
            .ok_or_else(|| NoteError::NoteNotFound { id: id.to_string() })?;
        self.state.notes.remove(index);
        info!("Deleted note {}", id);

        let was_selected = self.state.selected_note.as_deref() == Some(id);
        if was_selected {
            self.state.selected_note = self.sorted_notes().first().map(|n| n.id().to_string());
            debug!("Selection moved to {:?}", self.state.selected_note);
        }

        self.commit(StoreEvent::NoteDeleted { id: id.to_string() });
        if was_selected {
            self.subscribers.notify(&StoreEvent::SelectionChanged {
                id: self.state.selected_note.clone(),
            });
        }
        Ok(())
    }

    /// Selects a note, or clears the selection with `None`.
    pub fn set_selected_note(&mut self, id: Option<&str>) -> Result<()> {
        if let Some(id) = id {
            self.note_or_not_found(id)?;
        }
        if self.state.selected_note.as_deref() == id {
            return Ok(());
        }
        self.state.selected_note = id.map(str::to_string);
        self.commit(StoreEvent::SelectionChanged {
            id: self.state.selected_note.clone(),
        });
        Ok(())
    }

    /// Flips the pinned flag. Returns the new value.
    pub fn toggle_pin(&mut self, id: &str) -> Result<bool> {
        let now = self.clock.now();
        let note = self.note_mut(id)?;
        note.toggle_pin();
        note.touch(now);
        let pinned = note.is_pinned();
        self.commit(StoreEvent::NoteUpdated { id: id.to_string() });
        Ok(pinned)
    }

    pub fn archive_note(&mut self, id: &str) -> Result<()> {
        self.set_archived(id, true)
    }

    pub fn restore_note(&mut self, id: &str) -> Result<()> {
        self.set_archived(id, false)
    }

    fn set_archived(&mut self, id: &str, archived: bool) -> Result<()> {
        let now = self.clock.now();
        let note = self.note_mut(id)?;
        if note.set_archived(archived) {
            note.touch(now);
            self.commit(StoreEvent::NoteUpdated { id: id.to_string() });
        }
        Ok(())
    }

    // ----- tags and collaborators -----

    pub fn add_tag(&mut self, id: &str, tag: &str) -> Result<()> {
        let now = self.clock.now();
        let note = self.note_mut(id)?;
        if !note.add_tag(tag) {
            trace!("Tag {:?} not added to {}: blank or present", tag, id);
            return Ok(());
        }
        note.touch(now);
        if let Some(tag) = clean_label(tag) {
            self.register_tag(tag);
        }
        self.commit(StoreEvent::NoteUpdated { id: id.to_string() });
        Ok(())
    }

    pub fn remove_tag(&mut self, id: &str, tag: &str) -> Result<()> {
        let now = self.clock.now();
        let note = self.note_mut(id)?;
        if note.remove_tag(tag) {
            note.touch(now);
            self.commit(StoreEvent::NoteUpdated { id: id.to_string() });
        }
        Ok(())
    }

    /// Adds a collaborator label. The email is trimmed but not validated.
    pub fn add_collaborator(&mut self, id: &str, email: &str) -> Result<()> {
        let now = self.clock.now();
        let note = self.note_mut(id)?;
        if !note.add_collaborator(email) {
            return Ok(());
        }
        note.touch(now);
        self.commit(StoreEvent::NoteUpdated { id: id.to_string() });
        Ok(())
    }

    pub fn remove_collaborator(&mut self, id: &str, email: &str) -> Result<()> {
        let now = self.clock.now();
        let note = self.note_mut(id)?;
        if note.remove_collaborator(email) {
            note.touch(now);
            self.commit(StoreEvent::NoteUpdated { id: id.to_string() });
        }
        Ok(())
    }

    // ----- todos and attachments -----

    /// Appends a todo. Returns its id.
    pub fn add_todo(
        &mut self,
        id: &str,
        text: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<String> {
        self.note_or_not_found(id)?;
        let now = self.clock.now();
        let todo_id = self.ids.next(now);

        let note = self.note_mut(id)?;
        note.push_todo(Todo {
            id: todo_id.clone(),
            text: text.to_string(),
            completed: false,
            due_date,
        });
        note.touch(now);
        self.commit(StoreEvent::NoteUpdated { id: id.to_string() });
        Ok(todo_id)
    }

    /// Flips a todo's completion. Returns the new value.
    pub fn toggle_todo(&mut self, id: &str, todo_id: &str) -> Result<bool> {
        let now = self.clock.now();
        let note = self.note_mut(id)?;
        if !note.toggle_todo(todo_id) {
            return Err(NoteError::TodoNotFound {
                id: id.to_string(),
                todo_id: todo_id.to_string(),
            });
        }
        note.touch(now);
        let completed = note
            .todos()
            .iter()
            .find(|t| t.id == todo_id)
            .is_some_and(|t| t.completed);
        self.commit(StoreEvent::NoteUpdated { id: id.to_string() });
        Ok(completed)
    }

    /// Appends an attachment with a fresh id. Returns the id.
    pub fn add_attachment(&mut self, id: &str, attachment: NewAttachment) -> Result<String> {
        let mut ids = self.add_attachments(id, vec![attachment])?;
        Ok(ids.remove(0))
    }

    /// Appends a batch of attachments and persists once.
    pub fn add_attachments(
        &mut self,
        id: &str,
        attachments: Vec<NewAttachment>,
    ) -> Result<Vec<String>> {
        self.note_or_not_found(id)?;
        if attachments.is_empty() {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let records: Vec<Attachment> = attachments
            .into_iter()
            .map(|a| Attachment {
                id: self.ids.next(now),
                kind: a.kind,
                url: a.url,
                name: a.name,
            })
            .collect();
        let ids: Vec<String> = records.iter().map(|a| a.id.clone()).collect();

        let note = self.note_mut(id)?;
        for record in records {
            note.push_attachment(record);
        }
        note.touch(now);
        info!("Attached {} files to note {}", ids.len(), id);
        self.commit(StoreEvent::NoteUpdated { id: id.to_string() });
        Ok(ids)
    }

    // ----- versions -----

    /// Snapshots the current content. Returns the new version number.
    pub fn create_version(&mut self, id: &str) -> Result<u32> {
        let now = self.clock.now();
        let note = self.note_mut(id)?;
        let version = note.checkpoint(now);
        note.touch(now);
        info!("Created version {} of note {}", version, id);
        self.commit(StoreEvent::NoteUpdated { id: id.to_string() });
        Ok(version)
    }

    /// Restores content from a snapshot. History and the version counter are
    /// left as they are.
    pub fn revert_to_version(&mut self, id: &str, version: u32) -> Result<()> {
        let now = self.clock.now();
        let note = self.note_mut(id)?;
        if !note.revert_to(version, now) {
            return Err(NoteError::VersionNotFound {
                id: id.to_string(),
                version,
            });
        }
        info!("Reverted note {} to version {}", id, version);
        self.commit(StoreEvent::NoteUpdated { id: id.to_string() });
        Ok(())
    }

    // ----- templates, categories and view state -----

    /// Adds a template, replacing any existing one with the same id.
    /// Returns the id, or `None` if the name produces an empty id.
    pub fn add_template(&mut self, name: &str, content: &str) -> Option<String> {
        let template = Template::new(name.trim(), content);
        if template.id.is_empty() {
            warn!("Ignoring template with empty name");
            return None;
        }
        let id = template.id.clone();

        match self.state.templates.iter_mut().find(|t| t.id == id) {
            Some(existing) => {
                info!("Replacing template {}", id);
                *existing = template;
            }
            None => {
                info!("Adding template {}", id);
                self.state.templates.push(template);
            }
        }
        self.commit(StoreEvent::TemplateSaved { id: id.clone() });
        Some(id)
    }

    /// Adds a category and makes it the active filter. Returns false if the
    /// name is empty or already known (the filter still switches to it).
    ///
    /// `all` names the unfiltered view, so it only switches the filter back.
    pub fn add_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        if name == CategoryFilter::ALL {
            self.set_selected_category(CategoryFilter::All);
            return false;
        }
        let added = self.register_category(name);
        self.state.selected_category = CategoryFilter::Named(name.to_string());
        if added {
            self.commit(StoreEvent::CategoryAdded {
                name: name.to_string(),
            });
        } else {
            self.commit(StoreEvent::ViewChanged);
        }
        added
    }

    pub fn set_selected_category(&mut self, filter: CategoryFilter) {
        // Named("all") would be saved as "all" and read back as All.
        let filter = CategoryFilter::from(String::from(filter));
        if self.state.selected_category == filter {
            return;
        }
        self.state.selected_category = filter;
        self.commit(StoreEvent::ViewChanged);
    }

    pub fn set_search_term(&mut self, term: &str) {
        if self.state.search_term == term {
            return;
        }
        self.state.search_term = term.to_string();
        self.commit(StoreEvent::ViewChanged);
    }

    /// Returns the new preview mode.
    pub fn toggle_preview_mode(&mut self) -> bool {
        self.state.is_preview_mode = !self.state.is_preview_mode;
        self.commit(StoreEvent::ViewChanged);
        self.state.is_preview_mode
    }

    // ----- internals -----

    fn note_mut(&mut self, id: &str) -> Result<&mut Note> {
        self.state
            .notes
            .iter_mut()
            .find(|n| n.id() == id)
            .ok_or_else(|| NoteError::NoteNotFound { id: id.to_string() })
    }

    fn note_or_not_found(&self, id: &str) -> Result<&Note> {
        self.note(id)
            .ok_or_else(|| NoteError::NoteNotFound { id: id.to_string() })
    }

    fn register_category(&mut self, category: &str) -> bool {
        if category.is_empty()
            || category == CategoryFilter::ALL
            || self.state.categories.iter().any(|c| c == category)
        {
            return false;
        }
        self.state.categories.push(category.to_string());
        true
    }

    fn register_tag(&mut self, tag: &str) {
        if !self.state.tags.iter().any(|t| t == tag) {
            self.state.tags.push(tag.to_string());
        }
    }

    /// Writes the state and notifies subscribers of `event`.
    fn commit(&mut self, event: StoreEvent) {
        let failure = match self.backend.save(&self.state) {
            Ok(()) => {
                self.last_persistence_error = None;
                None
            }
            Err(e) => {
                let message = e.to_string();
                warn!(
                    "Failed to persist store to {}: {}. Continuing with in-memory state",
                    self.backend.describe(),
                    message
                );
                self.last_persistence_error = Some(message.clone());
                Some(StoreEvent::PersistenceFailed { message })
            }
        };

        self.subscribers.notify(&event);
        if let Some(failure) = failure {
            self.subscribers.notify(&failure);
        }
    }
}

impl std::fmt::Debug for NoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteStore")
            .field("notes", &self.state.notes.len())
            .field("backend", &self.backend.describe())
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileBackend, ManualClock, MemoryBackend};
    use chrono::{Duration, TimeZone};
    use std::{cell::RefCell, rc::Rc};
    use tempfile::tempdir;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn store() -> (NoteStore, ManualClock, MemoryBackend) {
        let clock = ManualClock::new(start());
        let backend = MemoryBackend::new();
        let store = NoteStore::open_with_clock(backend.clone(), clock.clone()).unwrap();
        (store, clock, backend)
    }

    /// Rejects every write.
    struct FullDisk;

    impl StateBackend for FullDisk {
        fn load(&self) -> Result<Option<StoreState>> {
            Ok(None)
        }

        fn save(&mut self, _state: &StoreState) -> Result<()> {
            Err(NoteError::PersistenceFailed {
                message: "quota exceeded".to_string(),
            })
        }

        fn describe(&self) -> String {
            "full disk".to_string()
        }
    }

    #[test]
    fn test_create_note_defaults_and_selection() {
        let (mut store, _, _) = store();
        let id = store.create_note(None).unwrap();

        let note = store.note(&id).unwrap();
        assert_eq!(note.title(), "Untitled Note");
        assert_eq!(note.content(), "");
        assert_eq!(note.category(), "");
        assert_eq!(note.version(), 1);
        assert!(note.versions().is_empty());
        assert!(note.tags().is_empty() && note.todos().is_empty());
        assert_eq!(store.selected_note_id(), Some(id.as_str()));
    }

    #[test]
    fn test_create_note_prepends_and_ids_are_unique() {
        let (mut store, _, _) = store();
        let first = store.create_note(None).unwrap();
        let second = store.create_note(None).unwrap();

        assert_ne!(first, second);
        let ids: Vec<&str> = store.notes().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
    }

    #[test]
    fn test_create_note_from_template_and_category_filter() {
        let (mut store, _, _) = store();
        store.set_selected_category(CategoryFilter::Named("work".into()));
        let id = store.create_note(Some("meeting")).unwrap();

        let note = store.note(&id).unwrap();
        assert!(note.content().starts_with("# Meeting: [Title]"));
        assert_eq!(note.category(), "work");
        assert_eq!(note.template(), Some("meeting"));
        assert_eq!(note.word_count(), stats_for(note.content()));
    }

    fn stats_for(content: &str) -> usize {
        crate::stats::compute(content).word_count
    }

    #[test]
    fn test_create_note_unknown_template_changes_nothing() {
        let (mut store, _, backend) = store();
        let err = store.create_note(Some("nope")).unwrap_err();

        assert!(matches!(err, NoteError::TemplateNotFound { .. }));
        assert!(store.notes().is_empty());
        assert!(backend.raw().is_none());
    }

    #[test]
    fn test_update_content_recomputes_stats_and_time() {
        let (mut store, clock, _) = store();
        let id = store.create_note(None).unwrap();
        clock.advance(Duration::minutes(3));

        store.update_note(&id, NotePatch::content("hello world")).unwrap();
        let note = store.note(&id).unwrap();
        assert_eq!(note.word_count(), 2);
        assert_eq!(note.read_time(), 1);
        assert_eq!(note.last_modified(), start() + Duration::minutes(3));

        store.update_note(&id, NotePatch::content("   ")).unwrap();
        let note = store.note(&id).unwrap();
        assert_eq!(note.word_count(), 0);
        assert_eq!(note.read_time(), 0);
    }

    #[test]
    fn test_update_title_keeps_stats() {
        let (mut store, _, _) = store();
        let id = store.create_note(None).unwrap();
        store.update_note(&id, NotePatch::content("a b c")).unwrap();
        store.update_note(&id, NotePatch::title("Groceries")).unwrap();

        let note = store.note(&id).unwrap();
        assert_eq!(note.title(), "Groceries");
        assert_eq!(note.word_count(), 3);
    }

    #[test]
    fn test_update_registers_category_and_tags() {
        let (mut store, _, _) = store();
        let id = store.create_note(None).unwrap();
        store
            .update_note(
                &id,
                NotePatch {
                    category: Some("home".into()),
                    tags: Some(vec!["a".into(), "a".into(), "b".into()]),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(store.categories(), &["home".to_string()]);
        assert_eq!(store.tags(), &["a".to_string(), "b".to_string()]);
        assert_eq!(store.note(&id).unwrap().tags().len(), 2);
    }

    #[test]
    fn test_update_cleans_tag_and_collaborator_lists() {
        let (mut store, _, _) = store();
        let id = store.create_note(None).unwrap();
        store.add_tag(&id, "x").unwrap();
        store
            .update_note(
                &id,
                NotePatch {
                    tags: Some(vec!["".into(), " x".into(), "x".into()]),
                    collaborators: Some(vec![" ana@example.com ".into(), "".into()]),
                    ..Default::default()
                },
            )
            .unwrap();

        let note = store.note(&id).unwrap();
        assert_eq!(note.tags(), &["x".to_string()]);
        assert_eq!(note.collaborators(), &["ana@example.com".to_string()]);
        assert_eq!(store.tags(), &["x".to_string()]);

        store.add_tag(&id, " y ").unwrap();
        assert_eq!(store.tags(), &["x".to_string(), "y".to_string()]);
        store.add_collaborator(&id, "ana@example.com  ").unwrap();
        assert_eq!(store.note(&id).unwrap().collaborators().len(), 1);
    }

    #[test]
    fn test_update_missing_note_is_not_found() {
        let (mut store, _, backend) = store();
        let err = store.update_note("missing", NotePatch::title("x")).unwrap_err();
        assert!(err.is_not_found());
        assert!(backend.raw().is_none());
    }

    #[test]
    fn test_tags_are_idempotent() {
        let (mut store, _, _) = store();
        let id = store.create_note(None).unwrap();

        store.add_tag(&id, "x").unwrap();
        store.add_tag(&id, "x").unwrap();
        store.add_tag(&id, "  ").unwrap();
        assert_eq!(store.note(&id).unwrap().tags(), &["x".to_string()]);

        store.remove_tag(&id, "y").unwrap();
        assert_eq!(store.note(&id).unwrap().tags(), &["x".to_string()]);

        store.remove_tag(&id, "x").unwrap();
        assert!(store.note(&id).unwrap().tags().is_empty());
        // The store-wide list remembers tags that were used.
        assert_eq!(store.tags(), &["x".to_string()]);
    }

    #[test]
    fn test_duplicate_tag_does_not_touch_note() {
        let (mut store, clock, _) = store();
        let id = store.create_note(None).unwrap();
        store.add_tag(&id, "x").unwrap();
        let before = store.note(&id).unwrap().last_modified();

        clock.advance(Duration::minutes(1));
        store.add_tag(&id, "x").unwrap();
        assert_eq!(store.note(&id).unwrap().last_modified(), before);
    }

    #[test]
    fn test_collaborators_have_set_semantics() {
        let (mut store, _, _) = store();
        let id = store.create_note(None).unwrap();

        store.add_collaborator(&id, "ana@example.com").unwrap();
        store.add_collaborator(&id, "ana@example.com").unwrap();
        store.add_collaborator(&id, "not an email").unwrap();
        assert_eq!(store.note(&id).unwrap().collaborators().len(), 2);

        store.remove_collaborator(&id, "ana@example.com").unwrap();
        store.remove_collaborator(&id, "ana@example.com").unwrap();
        assert_eq!(
            store.note(&id).unwrap().collaborators(),
            &["not an email".to_string()]
        );
    }

    #[test]
    fn test_todos_append_and_toggle() {
        let (mut store, _, _) = store();
        let id = store.create_note(None).unwrap();
        let due = start() + Duration::days(2);

        let first = store.add_todo(&id, "buy milk", None).unwrap();
        let second = store.add_todo(&id, "call bob", Some(due)).unwrap();
        assert_ne!(first, second);

        assert!(store.toggle_todo(&id, &first).unwrap());
        assert!(!store.toggle_todo(&id, &first).unwrap());
        assert!(store.toggle_todo(&id, &second).unwrap());

        let todos = store.note(&id).unwrap().todos();
        assert_eq!(todos[0].text, "buy milk");
        assert!(!todos[0].completed);
        assert_eq!(todos[1].due_date, Some(due));
        assert!(todos[1].completed);

        let err = store.toggle_todo(&id, "missing").unwrap_err();
        assert!(matches!(err, NoteError::TodoNotFound { .. }));
    }

    #[test]
    fn test_attachments_get_fresh_ids() {
        let (mut store, _, _) = store();
        let id = store.create_note(None).unwrap();
        let ids = store
            .add_attachments(
                &id,
                vec![
                    NewAttachment {
                        kind: "image/png".into(),
                        url: "/tmp/a.png".into(),
                        name: "a.png".into(),
                    },
                    NewAttachment {
                        kind: "text/plain".into(),
                        url: "/tmp/b.txt".into(),
                        name: "b.txt".into(),
                    },
                ],
            )
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[0], id);
        let attachments = store.note(&id).unwrap().attachments();
        assert_eq!(attachments[1].name, "b.txt");
        assert_eq!(attachments[0].id, ids[0]);
    }

    #[test]
    fn test_pin_and_archive() {
        let (mut store, _, _) = store();
        let id = store.create_note(None).unwrap();

        assert!(store.toggle_pin(&id).unwrap());
        assert!(store.note(&id).unwrap().is_pinned());
        assert!(!store.toggle_pin(&id).unwrap());

        store.archive_note(&id).unwrap();
        assert!(store.note(&id).unwrap().is_archived());
        assert_eq!(store.notes().len(), 1);
        store.restore_note(&id).unwrap();
        assert!(!store.note(&id).unwrap().is_archived());
    }

    #[test]
    fn test_create_version_numbers_increase() {
        let (mut store, _, _) = store();
        let id = store.create_note(None).unwrap();

        for expected in 2..=4 {
            assert_eq!(store.create_version(&id).unwrap(), expected);
        }
        let note = store.note(&id).unwrap();
        assert_eq!(note.version(), 4);
        let numbers: Vec<u32> = note.versions().iter().map(|s| s.version()).collect();
        assert_eq!(numbers, vec![2, 3, 4]);
    }

    #[test]
    fn test_version_scenario_with_revert() {
        let (mut store, _, _) = store();
        let id = store.create_note(None).unwrap();

        store.update_note(&id, NotePatch::content("hello world")).unwrap();
        let note = store.note(&id).unwrap();
        assert_eq!((note.word_count(), note.read_time()), (2, 1));

        let v = store.create_version(&id).unwrap();
        let note = store.note(&id).unwrap();
        assert_eq!(note.version(), 2);
        assert_eq!(note.versions().len(), 1);

        store.update_note(&id, NotePatch::content("hello world foo")).unwrap();
        assert_eq!(store.note(&id).unwrap().word_count(), 3);

        store.revert_to_version(&id, v).unwrap();
        let note = store.note(&id).unwrap();
        assert_eq!(note.content(), "hello world");
        assert_eq!(note.word_count(), 2);
        assert_eq!(note.version(), 2);
        assert_eq!(note.versions().len(), 1);
    }

    #[test]
    fn test_revert_keeps_newer_snapshots() {
        let (mut store, _, _) = store();
        let id = store.create_note(None).unwrap();
        store.update_note(&id, NotePatch::content("one")).unwrap();
        store.create_version(&id).unwrap();
        store.update_note(&id, NotePatch::content("two")).unwrap();
        store.create_version(&id).unwrap();

        store.revert_to_version(&id, 2).unwrap();
        let note = store.note(&id).unwrap();
        assert_eq!(note.content(), "one");
        assert_eq!(note.versions().len(), 2);
        assert_eq!(note.versions().find(3).map(|s| s.content()), Some("two"));
    }

    #[test]
    fn test_revert_unknown_version_changes_nothing() {
        let (mut store, clock, _) = store();
        let id = store.create_note(None).unwrap();
        store.update_note(&id, NotePatch::content("keep me")).unwrap();
        let before = store.note(&id).unwrap().clone();

        clock.advance(Duration::minutes(1));
        let err = store.revert_to_version(&id, 1).unwrap_err();
        assert!(matches!(err, NoteError::VersionNotFound { version: 1, .. }));
        assert_eq!(store.note(&id).unwrap(), &before);
    }

    #[test]
    fn test_default_ordering_pinned_then_recent() {
        let (mut store, clock, _) = store();
        let a = store.create_note(None).unwrap();
        let b = store.create_note(None).unwrap();
        let c = store.create_note(None).unwrap();

        clock.set(start());
        store.toggle_pin(&a).unwrap();
        clock.set(start() + Duration::minutes(5));
        store.toggle_pin(&c).unwrap();
        clock.set(start() + Duration::minutes(10));
        store.update_note(&b, NotePatch::title("B")).unwrap();

        let order: Vec<&str> = store.sorted_notes().iter().map(|n| n.id()).collect();
        assert_eq!(order, vec![c.as_str(), a.as_str(), b.as_str()]);
    }

    #[test]
    fn test_delete_selected_moves_to_first_in_order() {
        let (mut store, clock, _) = store();
        let older = store.create_note(None).unwrap();
        clock.advance(Duration::minutes(1));
        let pinned = store.create_note(None).unwrap();
        clock.advance(Duration::minutes(1));
        store.toggle_pin(&pinned).unwrap();
        clock.advance(Duration::minutes(1));
        let newest = store.create_note(None).unwrap();
        assert_eq!(store.selected_note_id(), Some(newest.as_str()));

        store.delete_note(&newest).unwrap();
        assert_eq!(store.selected_note_id(), Some(pinned.as_str()));

        store.delete_note(&pinned).unwrap();
        assert_eq!(store.selected_note_id(), Some(older.as_str()));

        store.delete_note(&older).unwrap();
        assert_eq!(store.selected_note_id(), None);
        assert!(store.notes().is_empty());
    }

    #[test]
    fn test_delete_unselected_keeps_selection() {
        let (mut store, _, _) = store();
        let first = store.create_note(None).unwrap();
        let second = store.create_note(None).unwrap();

        store.delete_note(&first).unwrap();
        assert_eq!(store.selected_note_id(), Some(second.as_str()));
        assert!(store.delete_note(&first).unwrap_err().is_not_found());
    }

    #[test]
    fn test_add_template_overwrites_same_id() {
        let (mut store, _, _) = store();
        assert_eq!(
            store.add_template("Weekly Review", "v1"),
            Some("weekly-review".to_string())
        );
        store.add_template("weekly   review", "v2");

        let matching: Vec<&Template> = store
            .templates()
            .iter()
            .filter(|t| t.id == "weekly-review")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].content, "v2");
        assert_eq!(store.templates().len(), 3);

        assert_eq!(store.add_template("", "ignored"), None);
        assert_eq!(store.add_template("   ", "ignored"), None);
        assert_eq!(
            store.add_template("  Bug Report ", "steps"),
            Some("bug-report".to_string())
        );
        assert_eq!(store.template("bug-report").unwrap().name, "Bug Report");
        assert_eq!(store.templates().len(), 4);
    }

    #[test]
    fn test_filtered_notes_by_search_and_category() {
        let (mut store, clock, _) = store();
        let groceries = store.create_note(None).unwrap();
        store
            .update_note(
                &groceries,
                NotePatch {
                    title: Some("Groceries".into()),
                    category: Some("home".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        clock.advance(Duration::minutes(1));
        let standup = store.create_note(None).unwrap();
        store
            .update_note(
                &standup,
                NotePatch {
                    content: Some("discuss GROCERY budget".into()),
                    category: Some("work".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        store.set_search_term("grocer");
        let ids: Vec<&str> = store.filtered_notes().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec![standup.as_str(), groceries.as_str()]);

        store.set_selected_category(CategoryFilter::Named("home".into()));
        let ids: Vec<&str> = store.filtered_notes().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec![groceries.as_str()]);
    }

    #[test]
    fn test_add_category_selects_it() {
        let (mut store, _, _) = store();
        assert!(store.add_category("ideas"));
        assert!(!store.add_category("ideas"));
        assert!(!store.add_category("   "));

        assert_eq!(store.categories(), &["ideas".to_string()]);
        assert_eq!(
            store.selected_category(),
            &CategoryFilter::Named("ideas".into())
        );
        let id = store.create_note(None).unwrap();
        assert_eq!(store.note(&id).unwrap().category(), "ideas");
    }

    #[test]
    fn test_all_category_survives_reload() {
        let (mut store, _, backend) = store();
        store.add_category("ideas");
        assert!(!store.add_category("all"));
        assert_eq!(store.selected_category(), &CategoryFilter::All);
        assert_eq!(store.categories(), &["ideas".to_string()]);

        store.set_selected_category(CategoryFilter::Named("all".into()));
        assert_eq!(store.selected_category(), &CategoryFilter::All);
        let id = store.create_note(None).unwrap();
        store.update_note(&id, NotePatch::category("all")).unwrap();
        assert_eq!(store.categories(), &["ideas".to_string()]);

        let mut reopened = NoteStore::open(backend.clone()).unwrap();
        assert_eq!(reopened.selected_category(), store.selected_category());
        assert_eq!(reopened.categories(), store.categories());
        let fresh = reopened.create_note(None).unwrap();
        assert_eq!(reopened.note(&fresh).unwrap().category(), "");
    }

    #[test]
    fn test_subscribers_see_every_change() {
        let (mut store, _, _) = store();
        let events = Rc::new(RefCell::new(Vec::new()));
        {
            let events = Rc::clone(&events);
            store.subscribe(move |e| events.borrow_mut().push(e.clone()));
        }

        let id = store.create_note(None).unwrap();
        store.add_tag(&id, "x").unwrap();
        store.add_tag(&id, "x").unwrap();
        store.delete_note(&id).unwrap();

        assert_eq!(
            *events.borrow(),
            vec![
                StoreEvent::NoteCreated { id: id.clone() },
                StoreEvent::NoteUpdated { id: id.clone() },
                StoreEvent::NoteDeleted { id: id.clone() },
                StoreEvent::SelectionChanged { id: None },
            ]
        );
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        let mut store = NoteStore::open_with_clock(FullDisk, ManualClock::new(start())).unwrap();
        let failures = Rc::new(RefCell::new(0));
        {
            let failures = Rc::clone(&failures);
            store.subscribe(move |e| {
                if matches!(e, StoreEvent::PersistenceFailed { .. }) {
                    *failures.borrow_mut() += 1;
                }
            });
        }

        let id = store.create_note(None).unwrap();
        store.update_note(&id, NotePatch::content("still here")).unwrap();

        assert_eq!(store.note(&id).unwrap().content(), "still here");
        assert!(store
            .last_persistence_error()
            .unwrap()
            .contains("quota exceeded"));
        assert_eq!(*failures.borrow(), 2);
    }

    #[test]
    fn test_every_change_is_persisted() {
        let (mut store, _, backend) = store();
        let id = store.create_note(None).unwrap();
        store.update_note(&id, NotePatch::content("saved text")).unwrap();

        let reopened = NoteStore::open(backend.clone()).unwrap();
        assert_eq!(reopened.note(&id).unwrap().content(), "saved text");
        assert_eq!(reopened.selected_note_id(), Some(id.as_str()));
    }

    #[test]
    fn test_reload_from_file_rehydrates_everything() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("note-store.json");
        let clock = ManualClock::new(start());

        let id = {
            let mut store =
                NoteStore::open_with_clock(FileBackend::new(&path), clock.clone()).unwrap();
            let id = store.create_note(Some("journal")).unwrap();
            store.add_tag(&id, "daily").unwrap();
            store.create_version(&id).unwrap();
            store.add_todo(&id, "stretch", Some(start())).unwrap();
            store.set_search_term("journal");
            store.toggle_preview_mode();
            id
        };

        let store = NoteStore::open_with_clock(FileBackend::new(&path), clock.clone()).unwrap();
        let note = store.note(&id).unwrap();
        assert_eq!(note.tags(), &["daily".to_string()]);
        assert_eq!(note.version(), 2);
        assert_eq!(note.versions().find(2).unwrap().timestamp(), start());
        assert_eq!(note.todos()[0].due_date, Some(start()));
        assert_eq!(note.last_modified(), start());
        assert_eq!(store.search_term(), "journal");
        assert!(store.is_preview_mode());
        assert_eq!(store.selected_note_id(), Some(id.as_str()));
    }

    #[test]
    fn test_load_recomputes_stale_stats_and_dangling_selection() {
        let backend = MemoryBackend::new();
        {
            let mut store = NoteStore::open(backend.clone()).unwrap();
            let id = store.create_note(None).unwrap();
            store.update_note(&id, NotePatch::content("one two three")).unwrap();
        }
        let mut raw: serde_json::Value = serde_json::from_str(&backend.raw().unwrap()).unwrap();
        raw["notes"][0]["wordCount"] = serde_json::json!(99);
        raw["selectedNote"] = serde_json::json!("gone");
        let state: StoreState = serde_json::from_value(raw).unwrap();
        let mut seeded = MemoryBackend::new();
        seeded.save(&state).unwrap();

        let store = NoteStore::open(seeded).unwrap();
        assert_eq!(store.notes()[0].word_count(), 3);
        assert_eq!(store.selected_note_id(), None);
    }

    #[test]
    fn test_ids_resume_after_loaded_notes() {
        let clock = ManualClock::new(start());
        let backend = MemoryBackend::new();
        let first = {
            let mut store = NoteStore::open_with_clock(backend.clone(), clock.clone()).unwrap();
            store.create_note(None).unwrap()
        };

        let mut store = NoteStore::open_with_clock(backend, clock).unwrap();
        let second = store.create_note(None).unwrap();
        assert_ne!(first, second);
    }
}
