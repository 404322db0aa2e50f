//! Wire type definitions for FileDock.
//!
//! This module defines the JSON shapes served by the daemon's HTTP API and
//! consumed by browser or CLI clients. All types serialize with snake_case
//! field names and ISO-8601 UTC timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MIME sentinel used for directories instead of a guessed media type.
pub const FOLDER_MIME: &str = "folder";

/// A point-in-time descriptor of one filesystem entry.
///
/// Nodes are stat projections: they describe the entry as it existed at the
/// moment the daemon read it, with no guarantee it still exists by the time
/// the client acts on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Final path segment (bare entry name).
    pub name: String,
    /// Whether the entry is a directory.
    pub is_folder: bool,
    /// Size in bytes; for directories this is the filesystem-reported size,
    /// not a recursive total.
    pub size: u64,
    /// Filesystem modification time.
    pub modified_at: DateTime<Utc>,
    /// Guessed media type, `application/octet-stream` when unknown, or the
    /// [`FOLDER_MIME`] sentinel for directories.
    pub mime_type: String,
    /// `/`-separated path from the sandbox root. The sole addressing token a
    /// client may hand back in subsequent requests.
    pub relative_path: String,
}

/// Response envelope for listing and search operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Echoed client path for listings, or a `Search: '<query>'` banner for
    /// search responses.
    pub path: String,
    /// Ordered entries (folders first).
    pub entries: Vec<Node>,
    /// Distinguishes search responses from directory listings structurally.
    pub is_search_result: bool,
}

impl Listing {
    /// Build a directory-listing response echoing the client path.
    pub fn directory(path: impl Into<String>, entries: Vec<Node>) -> Self {
        Self {
            path: path.into(),
            entries,
            is_search_result: false,
        }
    }

    /// Build a search response with the standard query banner.
    pub fn search(query: &str, entries: Vec<Node>) -> Self {
        Self {
            path: format!("Search: '{query}'"),
            entries,
            is_search_result: true,
        }
    }
}

/// Aggregate outcome of a bulk upload.
///
/// Bulk upload never aborts on the first bad item: every item is attempted
/// and per-item failures are collected here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadReport {
    /// Number of items written.
    pub written: usize,
    /// One human-readable message per failed item.
    pub errors: Vec<String>,
}

/// Request body for folder creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    /// Parent directory, relative to the sandbox root.
    pub parent_path: String,
    /// Name of the folder to create.
    pub name: String,
}

/// Request body for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    /// Entry to remove, relative to the sandbox root.
    pub path: String,
}

/// Request body for rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRequest {
    /// Entry to rename, relative to the sandbox root.
    pub path: String,
    /// New bare name (no path separators).
    pub new_name: String,
}

/// Request body for move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Entry to move, relative to the sandbox root.
    pub source: String,
    /// Destination folder, relative to the sandbox root.
    pub destination: String,
}

/// Query parameters addressing a single entry (download, view, archive).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathQuery {
    /// Target path; required by the handlers that use this query.
    pub path: Option<String>,
}

/// Query parameters for search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Substring to match against entry names, case-insensitively.
    pub query: Option<String>,
}

/// Success body for mutation operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Human-readable outcome description.
    pub message: String,
}

impl Ack {
    /// Build an acknowledgement from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure body carried by every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure description.
    pub error: String,
}

impl ErrorBody {
    /// Build an error body from any message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_node() -> Node {
        Node {
            name: "notes.txt".to_string(),
            is_folder: false,
            size: 1024,
            modified_at: DateTime::from_timestamp(1_714_564_800, 0).unwrap(),
            mime_type: "text/plain".to_string(),
            relative_path: "docs/notes.txt".to_string(),
        }
    }

    #[test]
    fn test_node_serializes_snake_case_with_iso_timestamp() {
        let json = serde_json::to_value(sample_node()).unwrap();
        assert_eq!(json["name"], "notes.txt");
        assert_eq!(json["is_folder"], false);
        assert_eq!(json["size"], 1024);
        assert_eq!(json["mime_type"], "text/plain");
        assert_eq!(json["relative_path"], "docs/notes.txt");
        assert_eq!(json["modified_at"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn test_folder_sentinel_survives_roundtrip() {
        let node = Node {
            name: "docs".to_string(),
            is_folder: true,
            size: 4096,
            mime_type: FOLDER_MIME.to_string(),
            relative_path: "docs".to_string(),
            ..sample_node()
        };
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mime_type, "folder");
        assert!(back.is_folder);
    }

    #[test]
    fn test_listing_directory_echoes_path() {
        let listing = Listing::directory("/docs", vec![sample_node()]);
        assert_eq!(listing.path, "/docs");
        assert!(!listing.is_search_result);
        assert_eq!(listing.entries.len(), 1);
    }

    #[test]
    fn test_listing_search_banner() {
        let listing = Listing::search("report", vec![]);
        assert_eq!(listing.path, "Search: 'report'");
        assert!(listing.is_search_result);
        assert!(listing.entries.is_empty());
    }

    #[test]
    fn test_requests_deserialize_from_client_json() {
        let rename: RenameRequest =
            serde_json::from_str(r#"{"path": "a.txt", "new_name": "b.txt"}"#).unwrap();
        assert_eq!(rename.path, "a.txt");
        assert_eq!(rename.new_name, "b.txt");

        let mv: MoveRequest =
            serde_json::from_str(r#"{"source": "a.txt", "destination": "docs"}"#).unwrap();
        assert_eq!(mv.source, "a.txt");
        assert_eq!(mv.destination, "docs");

        let create: CreateFolderRequest =
            serde_json::from_str(r#"{"parent_path": "/", "name": "new"}"#).unwrap();
        assert_eq!(create.parent_path, "/");
        assert_eq!(create.name, "new");
    }

    #[test]
    fn test_upload_report_default_is_empty() {
        let report = UploadReport::default();
        assert_eq!(report.written, 0);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_path_query_tolerates_missing_field() {
        let q: PathQuery = serde_json::from_str("{}").unwrap();
        assert!(q.path.is_none());
    }
}
