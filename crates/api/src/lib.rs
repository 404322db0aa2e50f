//! # FileDock API Types
//!
//! This crate defines the JSON wire types exchanged between the FileDock
//! daemon and its clients: filesystem node descriptors, listing/search
//! envelopes, mutation request payloads, and the uniform error body.
//!
//! ## Overview
//!
//! Every browsing response is a [`Listing`] carrying an ordered sequence of
//! [`Node`] records. A `Node` is a point-in-time stat projection of one
//! filesystem entry; its `relative_path` is the only addressing token a
//! client ever holds, always `/`-separated and always relative to the
//! daemon's sandbox root. Directories are marked with the `"folder"` MIME
//! sentinel ([`FOLDER_MIME`]) instead of a guessed media type.
//!
//! ## Example Usage
//!
//! ```rust
//! use api::{Listing, Node, FOLDER_MIME};
//! use chrono::DateTime;
//!
//! let node = Node {
//!     name: "reports".to_string(),
//!     is_folder: true,
//!     size: 4096,
//!     modified_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
//!     mime_type: FOLDER_MIME.to_string(),
//!     relative_path: "reports".to_string(),
//! };
//!
//! let listing = Listing::directory("/", vec![node]);
//! assert!(!listing.is_search_result);
//! ```
//!
//! ## Modules
//!
//! - [`types`]: node, listing, request, and error body definitions

pub mod types;

pub use types::{
    Ack, CreateFolderRequest, DeleteRequest, ErrorBody, Listing, MoveRequest, Node, PathQuery,
    RenameRequest, SearchQuery, UploadReport, FOLDER_MIME,
};
