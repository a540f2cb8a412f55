//! Turns files from the user's environment into attachment records.
//!
//! Nothing here checks file type or size; the media type is only a guess
//! from the extension.
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use log::{debug, trace, warn};
use walkdir::WalkDir;

use crate::{NewAttachment, NoteError, Result};

/// Fallback media type for unknown extensions.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Guesses a media type from the file extension.
pub fn media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "md" | "markdown" => "text/markdown",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        _ => UNKNOWN_MEDIA_TYPE,
    }
}

/// Builds one attachment record for a file.
pub fn attachment_for(path: &Path) -> Result<NewAttachment> {
    let absolute = path.canonicalize().map_err(|e| {
        warn!("Cannot resolve attachment path {}: {}", path.display(), e);
        NoteError::FileNotFound {
            file_path: path.display().to_string(),
        }
    })?;
    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| absolute.display().to_string());

    Ok(NewAttachment {
        kind: media_type(&absolute).to_string(),
        url: absolute.display().to_string(),
        name,
    })
}

/// Collects attachment records for files and, recursively, directories.
///
/// With a `pattern`, only files whose name matches the glob are taken.
/// Files named directly are subject to the pattern too. Directory entries
/// are visited in file-name order.
pub fn attachments_from_paths(paths: &[PathBuf], pattern: Option<&str>) -> Result<Vec<NewAttachment>> {
    let matcher: Option<GlobMatcher> = match pattern {
        Some(p) => Some(Glob::new(p)?.compile_matcher()),
        None => None,
    };
    let accepts = |path: &Path| match (&matcher, path.file_name()) {
        (Some(m), Some(name)) => m.is_match(name),
        (Some(_), None) => false,
        (None, _) => true,
    };

    let mut out = Vec::new();
    for path in paths {
        if !path.exists() {
            return Err(NoteError::FileNotFound {
                file_path: path.display().to_string(),
            });
        }

        if path.is_dir() {
            debug!("Collecting attachments under {}", path.display());
            for entry in WalkDir::new(path)
                .min_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file() && accepts(entry_path) {
                    trace!("Taking {}", entry_path.display());
                    out.push(attachment_for(entry_path)?);
                }
            }
        } else if accepts(path) {
            out.push(attachment_for(path)?);
        } else {
            debug!("Skipping {}: does not match filter", path.display());
        }
    }

    debug!("Collected {} attachments", out.len());
    Ok(out)
}
