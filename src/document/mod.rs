//! The document held by the input surface.
//!
//! A [`Document`] is the source text plus a revision counter that is bumped on
//! every change. It also tracks the bookkeeping an editor window needs: the
//! display name (`Untitled N` until the document has a file), the file path and
//! whether there are unsaved edits.

use crate::error::DocumentError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Extension used for workbench files
pub const FILE_EXTENSION: &str = "pad";

/// Process-wide counter for untitled document names
static UNTITLED_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn next_untitled_name() -> String {
    let n = UNTITLED_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("Untitled {}", n)
}

/// Appends [`FILE_EXTENSION`] to `path` unless it already carries it.
pub fn adapt_path(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == FILE_EXTENSION) {
        path.to_path_buf()
    } else {
        let mut os = path.as_os_str().to_owned();
        os.push(".");
        os.push(FILE_EXTENSION);
        PathBuf::from(os)
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    revision: u64,
    name: String,
    path: Option<PathBuf>,
    is_dirty: bool,
}

impl Document {
    /// Create an empty untitled document
    pub fn new() -> Self {
        Document {
            text: String::new(),
            revision: 0,
            name: next_untitled_name(),
            path: None,
            is_dirty: false,
        }
    }

    /// Create an untitled document holding `text`.
    ///
    /// The document is not dirty: there is nothing on disk to lose.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut doc = Document::new();
        doc.text = text.into();
        doc
    }

    /// Load a document from disk
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let text = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = text.len(), "opened document");
        Ok(Document {
            text,
            revision: 0,
            name: display_name(path),
            path: Some(path.to_path_buf()),
            is_dirty: false,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Monotonic revision, bumped on every change to the text
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// True when there is nothing worth evaluating
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replace the text. Bumps the revision and marks the document dirty.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.revision += 1;
        self.is_dirty = true;
    }

    /// Number this document's revisions after `previous`, e.g. when it
    /// replaces another document in the editor. Never moves backwards.
    pub fn continue_from(&mut self, previous: u64) {
        self.revision = self.revision.max(previous + 1);
    }

    /// Write the text to `path` (or the current path when `None`).
    ///
    /// A successful save adopts the path, renames the document and clears the
    /// dirty flag.
    pub fn save(&mut self, path: Option<&Path>) -> Result<PathBuf, DocumentError> {
        let target = match path {
            Some(p) => adapt_path(p),
            None => self.path.clone().ok_or_else(|| DocumentError::NoPath {
                name: self.name.clone(),
            })?,
        };

        fs::write(&target, &self.text).map_err(|source| DocumentError::Write {
            path: target.clone(),
            source,
        })?;

        tracing::info!(path = %target.display(), revision = self.revision, "saved document");
        self.name = display_name(&target);
        self.path = Some(target.clone());
        self.is_dirty = false;
        Ok(target)
    }

    /// Discard the contents and become a fresh untitled document.
    ///
    /// The revision keeps counting so observers still see a change.
    pub fn close(&mut self) {
        self.text.clear();
        self.revision += 1;
        self.name = next_untitled_name();
        self.path = None;
        self.is_dirty = false;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
