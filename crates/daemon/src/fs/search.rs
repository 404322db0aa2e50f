//! Recursive name search over the whole sandbox.

use api::Listing;
use walkdir::{DirEntry, WalkDir};

use super::catalog::{project_node, sort_folders_first};
use super::{Result, Sandbox};

/// Full-tree name matcher.
///
/// Every search walks the complete subtree under the root: no depth limit,
/// no result cap, no early termination. Cost is proportional to the number
/// of entries under the root.
#[derive(Debug, Clone)]
pub struct Finder {
    sandbox: Sandbox,
}

impl Finder {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }

    /// Case-insensitive substring search over bare entry names.
    ///
    /// Hidden entries are excluded and hidden directories pruned whole;
    /// symlinks are not followed. Unreadable subtrees are skipped rather than
    /// failing the search. An empty or whitespace-only query returns an empty
    /// result without touching the filesystem.
    pub fn search(&self, query: &str) -> Result<Listing> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Listing {
                path: "/".to_string(),
                entries: Vec::new(),
                is_search_result: true,
            });
        }
        let needle = query.to_lowercase();

        let mut entries = Vec::new();
        let walker = WalkDir::new(self.sandbox.root())
            .follow_links(false)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::debug!("search skipping unreadable entry: {err}");
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.to_lowercase().contains(&needle) {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };
            let relative_path = self.sandbox.relative(entry.path());
            entries.push(project_node(name, relative_path, &metadata));
        }
        sort_folders_first(&mut entries, |node| node.relative_path.as_str());

        Ok(Listing::search(query, entries))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
