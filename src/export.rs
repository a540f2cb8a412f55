//! Turning notes into files: markdown documents, rendered HTML and zip
//! archives of the whole collection.
//!
//! This is the only place that interprets markdown; the store treats content
//! as opaque text.
use std::{
    collections::HashSet,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, error, info, trace};
use pulldown_cmark::{html, Options, Parser};
use tempfile::NamedTempFile;
use zip::{write::SimpleFileOptions, ZipWriter};

use crate::{Note, NoteError, Result};

/// A note rendered as a downloadable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedNote {
    pub filename: String,
    pub body: String,
}

/// Derives a file stem from a title: lower-cased, whitespace runs become
/// hyphens. Path separators also become hyphens, and an empty title gives
/// `untitled`.
pub fn file_stem(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    let mut in_space = false;
    for ch in title.chars() {
        if ch.is_whitespace() {
            if !in_space {
                stem.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match ch {
            '/' | '\\' => stem.push('-'),
            _ => stem.extend(ch.to_lowercase()),
        }
    }
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem
    }
}

/// Builds the markdown document for a note: `# <title>`, a blank line, then
/// the content.
pub fn markdown_document(note: &Note) -> ExportedNote {
    ExportedNote {
        filename: format!("{}.md", file_stem(note.title())),
        body: format!("# {}\n\n{}", note.title(), note.content()),
    }
}

/// Renders markdown to HTML with the GitHub extensions (tables, task
/// lists, strikethrough, footnotes).
pub fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Renders a note's markdown document as HTML.
pub fn html_document(note: &Note) -> ExportedNote {
    let markdown = markdown_document(note);
    ExportedNote {
        filename: format!("{}.html", file_stem(note.title())),
        body: render_html(&markdown.body),
    }
}

/// Writes an exported document into `dir`, replacing any file of the same
/// name. Returns the written path.
pub fn write_document(doc: &ExportedNote, dir: &Path) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join(&doc.filename);
    debug!("Writing export to {}", path.display());

    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Failed to create temporary file: {}", e);
        NoteError::Io(e)
    })?;
    temp_file.write_all(doc.body.as_bytes())?;
    temp_file.flush()?;
    temp_file.persist(&path).map_err(|e| {
        error!("Failed to persist export {}: {}", path.display(), e.error);
        NoteError::Io(e.error)
    })?;

    info!("Exported {} ({} bytes)", path.display(), doc.body.len());
    Ok(path)
}

/// Writes every note's markdown document into one zip archive at `path`.
///
/// Notes sharing a title get `-2`, `-3`, ... appended to their file stem.
/// Returns the number of notes written.
pub fn export_archive<'a>(notes: impl IntoIterator<Item = &'a Note>, path: &Path) -> Result<usize> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;

    let temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Failed to create temporary archive: {}", e);
        NoteError::Io(e)
    })?;
    let mut zip = ZipWriter::new(temp_file);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut used: HashSet<String> = HashSet::new();
    let mut count = 0;
    for note in notes {
        let doc = markdown_document(note);
        let name = unique_name(&doc.filename, &mut used);
        trace!("Adding note {} to archive as {}", note.id(), name);

        zip.start_file(name, options)?;
        zip.write_all(doc.body.as_bytes()).map_err(|e| {
            error!("Failed to write note {} to archive: {}", note.id(), e);
            NoteError::Io(e)
        })?;
        count += 1;
    }

    let temp_file = zip.finish()?;
    temp_file.persist(path).map_err(|e| {
        error!("Failed to persist archive {}: {}", path.display(), e.error);
        NoteError::Io(e.error)
    })?;

    info!("Archived {} notes to {}", count, path.display());
    Ok(count)
}

fn unique_name(filename: &str, used: &mut HashSet<String>) -> String {
    let (stem, ext) = filename.rsplit_once('.').unwrap_or((filename, ""));
    let mut candidate = filename.to_string();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{}-{}.{}", stem, n, ext);
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        debug!("Creating export directory: {}", dir.display());
        fs::create_dir_all(dir).map_err(|e| {
            error!("Failed to create directory {}: {}", dir.display(), e);
            NoteError::DirectoryError {
                path: dir.to_path_buf(),
            }
        })?;
    }
    Ok(())
}
