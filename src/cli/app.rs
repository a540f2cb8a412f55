//! CLI module for the sagenote application
//!
//! This module handles the command-line interface for interacting with the
//! note store.
use std::{
    fs::read_to_string,
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
    process::Command,
};

use chrono::Utc;
use log::{debug, info, warn};
use shell_words::split;
use tempfile::Builder;

use crate::{
    attachments_from_paths, content_preview, export_archive, html_document, markdown_document,
    parse_due_date, parse_tags, render_html, write_document, CategoryFilter, Commands, Config,
    Note, NoteError, NotePatch, NoteStore, Result,
};

/// CLI Application handler - processes CLI commands and interfaces with NoteStore
pub struct App {
    /// The note store backend
    store: NoteStore,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application with the given store and config
    pub fn new(store: NoteStore, config: Config, verbose: bool) -> Self {
        Self {
            store,
            config,
            verbose,
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    /// Run the CLI application with the given command
    pub fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::New {
                template,
                title,
                content,
            } => self.create_note(template, title, content)?,

            Commands::List {
                search,
                category,
                archived,
                limit,
                json,
            } => self.list_notes(search, category, archived, limit, json)?,

            Commands::Show { id, json, html } => self.show_note(id, json, html)?,

            Commands::Edit {
                id,
                title,
                content,
                file,
                category,
                due,
                edit,
            } => self.handle_edit(id, title, content, file, category, due, edit)?,

            Commands::Delete { id, force } => self.handle_delete(id, force)?,

            Commands::Select { id } => {
                self.store.set_selected_note(id.as_deref())?;
                match id {
                    Some(id) => println!("Selected note {}", id),
                    None => println!("Selection cleared"),
                }
            }

            Commands::Pin { id } => {
                let pinned = self.store.toggle_pin(&id)?;
                println!("Note {} {}", id, if pinned { "pinned" } else { "unpinned" });
            }

            Commands::Archive { id } => {
                self.store.archive_note(&id)?;
                println!("Note {} archived", id);
            }

            Commands::Unarchive { id } => {
                self.store.restore_note(&id)?;
                println!("Note {} restored", id);
            }

            Commands::Tag { id, add, remove } => self.handle_tags(id, add, remove)?,

            Commands::Todo {
                id,
                add,
                due,
                toggle,
            } => self.handle_todos(id, add, due, toggle)?,

            Commands::Attach { id, paths, glob } => self.handle_attach(id, paths, glob)?,

            Commands::Share { id, add, remove } => self.handle_share(id, add, remove)?,

            Commands::Template {
                add,
                content,
                file,
                list,
            } => self.handle_templates(add, content, file, list)?,

            Commands::Version { id, create, revert } => {
                self.handle_versions(id, create, revert)?
            }

            Commands::Category { add, select } => self.handle_categories(add, select),

            Commands::Search { term } => {
                self.store.set_search_term(&term);
                if term.is_empty() {
                    println!("Search cleared");
                } else {
                    println!("Searching for \"{}\"", term);
                }
            }

            Commands::Preview => {
                let on = self.store.toggle_preview_mode();
                println!("Preview mode {}", if on { "on" } else { "off" });
            }

            Commands::Export { id, output, html } => self.handle_export(id, output, html)?,

            Commands::Backup { output } => self.handle_backup(output)?,

            Commands::Config => {
                println!("{}", serde_json::to_string_pretty(&self.config)?);
                println!("Store record: {}", self.config.store_path().display());
            }
        }

        self.report_persistence();
        Ok(())
    }

    /// Warns the user when the last write to disk failed.
    fn report_persistence(&self) {
        if let Some(message) = self.store.last_persistence_error() {
            eprintln!(
                "{} changes were not saved to disk: {}",
                console::style("warning:").yellow().bold(),
                message
            );
        }
    }

    fn create_note(
        &mut self,
        template: Option<String>,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<()> {
        let id = self.store.create_note(template.as_deref())?;

        let patch = NotePatch {
            title,
            content,
            ..Default::default()
        };
        if !patch.is_empty() {
            self.store.update_note(&id, patch)?;
        }

        println!("Note created with ID: {}", id);
        Ok(())
    }

    fn list_notes(
        &self,
        search: Option<String>,
        category: Option<String>,
        include_archived: bool,
        limit: usize,
        json: bool,
    ) -> Result<()> {
        let search = search.unwrap_or_else(|| self.store.search_term().to_string());
        let category = category
            .map(CategoryFilter::from)
            .unwrap_or_else(|| self.store.selected_category().clone());
        debug!("Listing notes: search={:?}, category={}", search, category);

        let mut notes: Vec<&Note> = self
            .store
            .query_notes(&search, &category)
            .into_iter()
            .filter(|note| include_archived || !note.is_archived())
            .collect();

        if limit > 0 && notes.len() > limit {
            notes.truncate(limit);
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&notes)?);
            return Ok(());
        }

        if notes.is_empty() {
            println!("No notes found matching the criteria.");
            return Ok(());
        }
        self.display_notes_text(&notes);
        println!(
            "\nFound {} note{}",
            notes.len(),
            if notes.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    /// Display notes in text format
    fn display_notes_text(&self, notes: &[&Note]) {
        // Use terminal width for formatting if available
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);
        let selected = self.store.selected_note_id();

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }

            let marker = if selected == Some(note.id()) { ">" } else { " " };
            let pin = if note.is_pinned() { " [pinned]" } else { "" };
            let archived = if note.is_archived() { " [archived]" } else { "" };
            println!(
                "{} ID: {} | Modified: {}{}{}",
                marker,
                note.id(),
                note.last_modified().format("%Y-%m-%d %H:%M"),
                console::style(pin).magenta(),
                console::style(archived).dim()
            );
            println!("  Title: {}", console::style(note.title()).bold());

            if !note.category().is_empty() {
                println!("  Category: {}", note.category());
            }
            if !note.tags().is_empty() {
                let tags = note
                    .tags()
                    .iter()
                    .map(|tag| format!("#{}", tag))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("  Tags: {}", console::style(tags).cyan());
            }
            println!(
                "  {} words, {} min read",
                note.word_count(),
                note.read_time()
            );

            let preview = content_preview(note.content(), term_width.saturating_sub(4).min(100));
            if !preview.is_empty() {
                println!("  {}", console::style(preview).dim());
            }
        }
    }

    fn resolve_note(&self, id: Option<String>) -> Result<&Note> {
        match id {
            Some(id) => self
                .store
                .note(&id)
                .ok_or(NoteError::NoteNotFound { id }),
            None => self.store.selected_note().ok_or(NoteError::ApplicationError {
                message: "No note selected. Pass an ID or use `select`".to_string(),
            }),
        }
    }

    fn show_note(&self, id: Option<String>, json: bool, html: bool) -> Result<()> {
        let note = self.resolve_note(id)?;

        if json {
            println!("{}", serde_json::to_string_pretty(note)?);
            return Ok(());
        }
        if html || self.store.is_preview_mode() {
            println!("{}", render_html(&markdown_document(note).body));
            return Ok(());
        }

        println!("{}", console::style(note.title()).bold().underlined());
        println!("ID: {}", note.id());
        println!(
            "Modified: {}",
            note.last_modified().format("%Y-%m-%d %H:%M:%S")
        );
        if !note.category().is_empty() {
            println!("Category: {}", note.category());
        }
        if !note.tags().is_empty() {
            println!("Tags: {}", console::style(note.tags().join(", ")).cyan());
        }
        if let Some(due) = note.due_date() {
            println!("Due: {}", due.format("%Y-%m-%d"));
        }
        if !note.collaborators().is_empty() {
            println!("Shared with: {}", note.collaborators().join(", "));
        }
        println!(
            "Version {} | {} words | {} min read{}{}",
            note.version(),
            note.word_count(),
            note.read_time(),
            if note.is_pinned() { " | pinned" } else { "" },
            if note.is_archived() { " | archived" } else { "" }
        );

        println!("\n{}", note.content());

        if !note.todos().is_empty() {
            println!("\nTodos:");
            self.print_todos(note);
        }
        if !note.attachments().is_empty() {
            println!("\nAttachments:");
            for attachment in note.attachments() {
                println!(
                    "  {} {} ({}) {}",
                    attachment.id, attachment.name, attachment.kind, attachment.url
                );
            }
        }
        Ok(())
    }

    fn print_todos(&self, note: &Note) {
        for todo in note.todos() {
            let due = todo
                .due_date
                .map(|d| format!(" (due {})", d.format("%Y-%m-%d")))
                .unwrap_or_default();
            println!(
                "  [{}] {} {}{}",
                if todo.completed { "x" } else { " " },
                todo.id,
                todo.text,
                due
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_edit(
        &mut self,
        id: String,
        title: Option<String>,
        content: Option<String>,
        file: Option<PathBuf>,
        category: Option<String>,
        due: Option<String>,
        open_editor: bool,
    ) -> Result<()> {
        // Validate input - check for conflicting options
        let content_sources = [content.is_some(), file.is_some(), open_editor]
            .iter()
            .filter(|set| **set)
            .count();
        if content_sources > 1 {
            return Err(NoteError::ApplicationError {
                message: "Use only one of --content, --file and --edit".to_string(),
            });
        }

        let current = self
            .store
            .note(&id)
            .ok_or_else(|| NoteError::NoteNotFound { id: id.clone() })?;

        let content = match (content, file) {
            (Some(c), _) => Some(c),
            (_, Some(path)) => Some(self.read_content_from_file(&path)?),
            (None, None) if open_editor => {
                Some(self.open_editor_with_content(current.content())?)
            }
            (None, None) => None,
        };

        let due_date = due
            .map(|d| {
                if d.trim().is_empty() {
                    Ok(None)
                } else {
                    parse_due_date(&d).map(Some)
                }
            })
            .transpose()?;

        let patch = NotePatch {
            title,
            content,
            category,
            due_date,
            ..Default::default()
        };
        if patch.is_empty() {
            return Err(NoteError::ApplicationError {
                message: "Nothing to change. See `edit --help`".to_string(),
            });
        }

        self.store.update_note(&id, patch)?;
        println!("Note {} updated successfully", id);
        Ok(())
    }

    // Helper function for reading content from file
    fn read_content_from_file(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(NoteError::FileNotFound {
                file_path: path.display().to_string(),
            });
        }
        read_to_string(path).map_err(NoteError::Io)
    }

    // Helper function to open editor with existing content
    fn open_editor_with_content(&self, existing_content: &str) -> Result<String> {
        let mut temp_file = Builder::new().suffix(".md").tempfile()?;
        temp_file.write_all(existing_content.as_bytes())?;
        temp_file.flush()?;

        let editor_cmd = self.config.get_editor_command();
        info!("Opening editor to write note content. Save and exit when done...");
        self.launch_editor(&editor_cmd, temp_file.path())?;

        read_to_string(temp_file.path()).map_err(NoteError::Io)
    }

    fn launch_editor(&self, editor_cmd: &str, file_path: &Path) -> Result<()> {
        // Handle shell-like command parsing
        let args = split(editor_cmd).map_err(|e| NoteError::EditorError {
            message: format!("Failed to parse editor command: {}", e),
        })?;

        let Some((program, rest)) = args.split_first() else {
            return Err(NoteError::EditorError {
                message: "Empty editor command".to_string(),
            });
        };

        let status = Command::new(program)
            .args(rest)
            .arg(file_path)
            .status()
            .map_err(|e| NoteError::EditorError {
                message: format!("Failed to execute editor command: {}", e),
            })?;

        if !status.success() {
            return Err(NoteError::EditorError {
                message: "Editor exited with non-zero status".to_string(),
            });
        }

        Ok(())
    }

    fn handle_delete(&mut self, id: String, force: bool) -> Result<()> {
        // Fetch the note first to verify it exists and show details in the prompt
        let note = self
            .store
            .note(&id)
            .ok_or_else(|| NoteError::NoteNotFound { id: id.clone() })?;
        let title = note.title().to_string();

        if !force {
            println!("You are about to delete the following note:");
            println!("ID:      {}", note.id());
            println!("Title:   {}", note.title());
            println!("Tags:    {}", note.tags().join(", "));
            println!("Versions: {}", note.versions().len());

            let preview = content_preview(note.content(), 80);
            if !preview.is_empty() {
                println!("\nContent preview:\n{}", preview);
            }

            println!("\nThis action cannot be undone! Use `archive` to hide it instead.");
            print!("Are you sure you want to delete this note? [y/N]: ");
            stdout().flush().map_err(NoteError::Io)?;

            let mut input = String::new();
            stdin().read_line(&mut input).map_err(NoteError::Io)?;

            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.store.delete_note(&id)?;
        println!("Note '{}' ({}) has been permanently deleted.", title, id);
        if let Some(next) = self.store.selected_note() {
            println!("Now selected: {} ({})", next.title(), next.id());
        }
        Ok(())
    }

    fn handle_tags(&mut self, id: String, add: Option<String>, remove: Option<String>) -> Result<()> {
        let to_add = parse_tags(add);
        let to_remove = parse_tags(remove);

        for tag in &to_add {
            self.store.add_tag(&id, tag)?;
        }
        for tag in &to_remove {
            self.store.remove_tag(&id, tag)?;
        }

        let note = self.resolve_note(Some(id))?;
        if note.tags().is_empty() {
            println!("Note {} has no tags", note.id());
        } else {
            println!("Tags for {}: {}", note.id(), note.tags().join(", "));
        }
        Ok(())
    }

    fn handle_todos(
        &mut self,
        id: String,
        add: Option<String>,
        due: Option<String>,
        toggle: Option<String>,
    ) -> Result<()> {
        if let Some(text) = add {
            let due_date = due.as_deref().map(parse_due_date).transpose()?;
            let todo_id = self.store.add_todo(&id, &text, due_date)?;
            println!("Todo added with ID: {}", todo_id);
        }
        if let Some(todo_id) = toggle {
            let done = self.store.toggle_todo(&id, &todo_id)?;
            println!(
                "Todo {} marked {}",
                todo_id,
                if done { "done" } else { "not done" }
            );
        }

        let note = self.resolve_note(Some(id))?;
        if note.todos().is_empty() {
            println!("Note {} has no todos", note.id());
        } else {
            self.print_todos(note);
        }
        Ok(())
    }

    fn handle_attach(&mut self, id: String, paths: Vec<PathBuf>, glob: Option<String>) -> Result<()> {
        // Check the note first so a bad ID fails before walking directories
        self.resolve_note(Some(id.clone()))?;

        let attachments = attachments_from_paths(&paths, glob.as_deref())?;
        if attachments.is_empty() {
            println!("No files matched; nothing attached.");
            return Ok(());
        }

        let names: Vec<String> = attachments.iter().map(|a| a.name.clone()).collect();
        let ids = self.store.add_attachments(&id, attachments)?;
        for (attachment_id, name) in ids.iter().zip(&names) {
            println!("Attached {} as {}", name, attachment_id);
        }
        Ok(())
    }

    fn handle_share(&mut self, id: String, add: Option<String>, remove: Option<String>) -> Result<()> {
        if let Some(email) = add {
            self.store.add_collaborator(&id, email.trim())?;
        }
        if let Some(email) = remove {
            self.store.remove_collaborator(&id, email.trim())?;
        }

        let note = self.resolve_note(Some(id))?;
        if note.collaborators().is_empty() {
            println!("Note {} is not shared", note.id());
        } else {
            println!("Shared with: {}", note.collaborators().join(", "));
        }
        Ok(())
    }

    fn handle_templates(
        &mut self,
        add: Option<String>,
        content: Option<String>,
        file: Option<PathBuf>,
        list: bool,
    ) -> Result<()> {
        if let Some(name) = add {
            let content = match (content, file) {
                (Some(_), Some(_)) => {
                    return Err(NoteError::ApplicationError {
                        message: "Cannot specify both --content and --file options".to_string(),
                    })
                }
                (Some(c), None) => c,
                (None, Some(path)) => self.read_content_from_file(&path)?,
                (None, None) => String::new(),
            };
            match self.store.add_template(name.trim(), &content) {
                Some(template_id) => println!("Template saved with ID: {}", template_id),
                None => {
                    return Err(NoteError::ApplicationError {
                        message: "Template name cannot be empty".to_string(),
                    })
                }
            }
            if !list {
                return Ok(());
            }
        }

        for template in self.store.templates() {
            println!(
                "{:<20} {}",
                console::style(&template.id).bold(),
                template.name
            );
            if self.verbose {
                println!("{}\n", console::style(&template.content).dim());
            }
        }
        Ok(())
    }

    fn handle_versions(&mut self, id: String, create: bool, revert: Option<u32>) -> Result<()> {
        if create {
            let version = self.store.create_version(&id)?;
            println!("Saved version {} of note {}", version, id);
        }
        if let Some(version) = revert {
            self.store.revert_to_version(&id, version)?;
            println!("Note {} reverted to version {}", id, version);
        }
        if create || revert.is_some() {
            return Ok(());
        }

        let note = self.resolve_note(Some(id))?;
        if note.versions().is_empty() {
            println!(
                "Note {} has no saved versions (current version {})",
                note.id(),
                note.version()
            );
            return Ok(());
        }
        for snapshot in note.versions() {
            println!(
                "Version {:<4} {}  {}",
                snapshot.version(),
                snapshot.timestamp().format("%b %-d, %Y %-I:%M %p"),
                console::style(content_preview(snapshot.content(), 60)).dim()
            );
        }
        Ok(())
    }

    fn handle_categories(&mut self, add: Option<String>, select: Option<String>) {
        if let Some(name) = add {
            if self.store.add_category(&name) {
                println!("Category '{}' added", name.trim());
            }
        }
        if let Some(filter) = select {
            self.store.set_selected_category(CategoryFilter::from(filter));
        }

        let active = self.store.selected_category().to_string();
        println!("{} {}", if active == CategoryFilter::ALL { "*" } else { " " }, CategoryFilter::ALL);
        for category in self.store.categories() {
            println!("{} {}", if *category == active { "*" } else { " " }, category);
        }
    }

    fn handle_export(&self, id: String, output: Option<PathBuf>, html: bool) -> Result<()> {
        let note = self.resolve_note(Some(id))?;
        let dir = output.unwrap_or_else(|| self.config.export_dir.clone());
        let doc = if html {
            html_document(note)
        } else {
            markdown_document(note)
        };

        let path = write_document(&doc, &dir)?;
        println!("Exported to {}", path.display());
        Ok(())
    }

    fn handle_backup(&self, output: Option<PathBuf>) -> Result<()> {
        let path = output.unwrap_or_else(|| {
            let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
            self.config
                .export_dir
                .join(format!("sagenote_backup_{}.zip", timestamp))
        });

        if self.store.notes().is_empty() {
            warn!("Writing an empty archive: the store has no notes");
        }
        let count = export_archive(self.store.notes(), &path)?;
        println!("Archived {} notes to {}", count, path.display());
        Ok(())
    }
}
