//! Directory listing and the stat-to-Node projection.
//!
//! The projection here is shared with search: one entry, one live stat, one
//! [`Node`]. Nothing is cached; every listing reads the tree as it is at
//! request time.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use api::{Listing, Node, FOLDER_MIME};
use chrono::{DateTime, Utc};

use super::{FsError, Result, Sandbox};

/// Lists immediate children of sandboxed directories.
#[derive(Debug, Clone)]
pub struct Catalog {
    sandbox: Sandbox,
}

impl Catalog {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }

    /// List the immediate children of a client path.
    ///
    /// Hidden entries are skipped, as are entries whose metadata cannot be
    /// read (dangling symlinks, permission holes). Folders sort before
    /// files; within each group names compare case-insensitively.
    pub fn list(&self, client_path: &str) -> Result<Listing> {
        let dir = self.sandbox.resolve(client_path)?;
        if !dir.is_dir() {
            return Err(FsError::NotADirectory(client_path.to_string()));
        }

        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&dir)? {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let metadata = match fs::metadata(dir_entry.path()) {
                Ok(m) => m,
                Err(_) => continue,
            };
            let relative_path = self.sandbox.relative(&dir_entry.path());
            entries.push(project_node(name, relative_path, &metadata));
        }
        sort_folders_first(&mut entries, |node| node.name.as_str());

        Ok(Listing::directory(client_path, entries))
    }
}

/// Project one stat result into a wire [`Node`].
///
/// Directories get the `"folder"` MIME sentinel; files get an
/// extension-based guess with an octet-stream fallback. Directory sizes are
/// whatever the filesystem reports for the directory entry itself.
pub(crate) fn project_node(name: String, relative_path: String, metadata: &fs::Metadata) -> Node {
    let is_folder = metadata.is_dir();
    let mime_type = if is_folder {
        FOLDER_MIME.to_string()
    } else {
        mime_guess::from_path(Path::new(&name))
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    };

    Node {
        name,
        is_folder,
        size: metadata.len(),
        modified_at: modified_time(metadata),
        mime_type,
        relative_path,
    }
}

fn modified_time(metadata: &fs::Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::from)
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Sort folders before files; within each group, compare `key` output
/// case-insensitively.
pub(crate) fn sort_folders_first(entries: &mut [Node], key: fn(&Node) -> &str) {
    entries.sort_by(|a, b| match (a.is_folder, b.is_folder) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => key(a).to_lowercase().cmp(&key(b).to_lowercase()),
    });
}
