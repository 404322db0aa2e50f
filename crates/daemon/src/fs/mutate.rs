//! Mutation operations: create folder, upload, delete, rename, move.
//!
//! Every operation resolves its path arguments through the sandbox before
//! touching the filesystem, and runs its pre-condition checks on the resolved
//! paths. Nothing here locks or serializes: concurrent mutations race with
//! whatever atomicity the underlying filesystem gives rename/remove/mkdir.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use api::UploadReport;
use bytes::Bytes;

use super::{FsError, Result, Sandbox};

/// One file carried by an upload request.
#[derive(Debug, Clone)]
pub struct UploadItem {
    /// Raw file bytes.
    pub data: Bytes,
    /// Client-supplied name. Items with an empty name are placeholders and
    /// are skipped without counting as failures.
    pub name: String,
    /// `/`-separated path inside an uploaded folder tree, when the client
    /// sent a whole directory. The directory portion is recreated under the
    /// destination.
    pub relative_path: Option<String>,
}

impl UploadItem {
    /// Flat file item written directly into the destination.
    pub fn flat(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            name: name.into(),
            relative_path: None,
        }
    }

    /// Tree item carrying its path inside the uploaded folder.
    pub fn nested(relative_path: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let relative_path = relative_path.into();
        let name = relative_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            data: data.into(),
            name,
            relative_path: Some(relative_path),
        }
    }
}

/// What a delete removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovedKind {
    File,
    Folder,
}

/// Filesystem mutations under the sandbox root.
#[derive(Debug, Clone)]
pub struct Mutator {
    sandbox: Sandbox,
}

impl Mutator {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }

    /// Create a folder named `name` under `parent_path`, creating missing
    /// ancestors along the way. Returns the sanitized folder name.
    pub fn create_folder(&self, parent_path: &str, name: &str) -> Result<String> {
        let safe_name = sanitize_name(name);
        if safe_name.is_empty() {
            return Err(FsError::InvalidPath);
        }
        let parent = self.sandbox.resolve(parent_path)?;
        let target = parent.join(&safe_name);
        self.sandbox.ensure_contains(&target)?;
        if target.exists() {
            return Err(FsError::Conflict(safe_name));
        }
        fs::create_dir_all(&target)?;
        tracing::info!(folder = %self.sandbox.relative(&target), "folder created");
        Ok(safe_name)
    }

    /// Write every upload item under `destination_path`.
    ///
    /// The destination (and any per-item subfolder) is created as needed.
    /// Existing files are silently replaced. The operation never
    /// short-circuits: failures are collected per item and reported in the
    /// aggregate.
    pub fn upload(&self, destination_path: &str, items: Vec<UploadItem>) -> Result<UploadReport> {
        let destination = self.sandbox.resolve(destination_path)?;
        fs::create_dir_all(&destination)?;

        let mut report = UploadReport::default();
        for item in items {
            if item.name.is_empty() {
                continue;
            }
            match self.write_item(&destination, &item) {
                Ok(()) => report.written += 1,
                Err(err) => report.errors.push(format!("{}: {}", item.name, err)),
            }
        }
        tracing::info!(
            written = report.written,
            failed = report.errors.len(),
            "upload finished"
        );
        Ok(report)
    }

    fn write_item(&self, destination: &Path, item: &UploadItem) -> Result<()> {
        let target = self.item_target(destination, item)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &item.data)?;
        Ok(())
    }

    /// Compute where an item lands: flat items go straight into the
    /// destination, tree items keep their directory portion. The sanitized
    /// basename and re-containment check guard against crafted fragments.
    fn item_target(&self, destination: &Path, item: &UploadItem) -> Result<PathBuf> {
        let dir = match item.relative_path.as_deref() {
            Some(raw) => {
                let tree_path = Path::new(raw.trim_matches('/'));
                match tree_path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => destination.join(parent),
                    _ => destination.to_path_buf(),
                }
            }
            None => destination.to_path_buf(),
        };
        self.sandbox.ensure_contains(&dir)?;

        let safe_name = sanitize_name(&item.name);
        if safe_name.is_empty() {
            return Err(FsError::InvalidPath);
        }
        Ok(dir.join(safe_name))
    }

    /// Remove a file (or symlink) alone, or a directory with its entire
    /// contents.
    pub fn remove(&self, client_path: &str) -> Result<RemovedKind> {
        let target = self.sandbox.resolve(client_path)?;
        // symlink_metadata so a link to a directory is removed as a link,
        // never followed into its target.
        let metadata = match fs::symlink_metadata(&target) {
            Ok(m) => m,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(FsError::NotFound(client_path.to_string()))
            }
            Err(err) => return Err(err.into()),
        };
        if metadata.is_dir() {
            fs::remove_dir_all(&target)?;
            tracing::info!(folder = %client_path, "folder deleted");
            Ok(RemovedKind::Folder)
        } else {
            fs::remove_file(&target)?;
            tracing::info!(file = %client_path, "file deleted");
            Ok(RemovedKind::File)
        }
    }

    /// Rename an entry in place, keeping it under the same parent.
    /// Returns the sanitized final name.
    pub fn rename(&self, client_path: &str, new_name: &str) -> Result<String> {
        let safe_name = sanitize_name(new_name);
        if safe_name.is_empty() {
            return Err(FsError::InvalidPath);
        }
        let source = self.sandbox.resolve(client_path)?;
        self.ensure_exists(&source, client_path)?;

        let parent = source.parent().ok_or(FsError::InvalidPath)?;
        let target = parent.join(&safe_name);
        self.sandbox.ensure_contains(&target)?;
        if target.exists() {
            return Err(FsError::Conflict(safe_name));
        }
        fs::rename(&source, &target)?;
        tracing::info!(from = %client_path, to = %safe_name, "entry renamed");
        Ok(safe_name)
    }

    /// Move an entry into another folder. Rename-based, so atomic on the
    /// same volume and never a partial copy. Returns the new relative path.
    pub fn relocate(&self, source_path: &str, destination_path: &str) -> Result<String> {
        let source = self.sandbox.resolve(source_path)?;
        let destination = self.sandbox.resolve(destination_path)?;
        self.ensure_exists(&source, source_path)?;
        if !destination.is_dir() {
            return Err(FsError::NotADirectory(destination_path.to_string()));
        }

        let name = source
            .file_name()
            .ok_or(FsError::InvalidPath)?
            .to_string_lossy()
            .into_owned();
        if parent_is(&source, &destination) {
            return Err(FsError::AlreadyThere(name));
        }
        if source.is_dir() && is_descendant_of(&destination, &source) {
            return Err(FsError::SelfMove(name));
        }
        let target = destination.join(&name);
        if target.exists() {
            return Err(FsError::Conflict(name));
        }
        fs::rename(&source, &target)?;
        let new_path = self.sandbox.relative(&target);
        tracing::info!(from = %source_path, to = %new_path, "entry moved");
        Ok(new_path)
    }

    fn ensure_exists(&self, absolute: &Path, client_path: &str) -> Result<()> {
        if fs::symlink_metadata(absolute).is_ok() {
            Ok(())
        } else {
            Err(FsError::NotFound(client_path.to_string()))
        }
    }
}

/// `true` when `path`'s immediate parent is exactly `folder`.
fn parent_is(path: &Path, folder: &Path) -> bool {
    path.parent() == Some(folder)
}

/// Component-wise ancestry test; `true` when `path` equals `ancestor` too.
fn is_descendant_of(path: &Path, ancestor: &Path) -> bool {
    path.starts_with(ancestor)
}

/// Collapse an externally supplied name to a token safe for the host
/// filesystem: whitespace runs become `_`, path separators and other special
/// characters are dropped, leading and trailing dots, dashes and underscores
/// are trimmed. May return an empty string; callers decide whether that is
/// an error (create, rename) or a skip (upload).
pub fn sanitize_name(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            pending_space = !collapsed.is_empty();
            continue;
        }
        if ch.is_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            if pending_space {
                collapsed.push('_');
                pending_space = false;
            }
            collapsed.push(ch);
        }
    }
    collapsed
        .trim_matches(|c| matches!(c, '.' | '_' | '-'))
        .to_string()
}
