//! Sandboxed filesystem engine.
//!
//! Everything the daemon does to the managed directory goes through this
//! module: path containment ([`Sandbox`]), listing ([`Catalog`]), recursive
//! search ([`Finder`]), mutations ([`Mutator`]) and folder archiving
//! ([`Archiver`]). Client-supplied paths are only ever turned into real
//! filesystem paths by [`Sandbox::resolve`]; the other components refuse to
//! touch anything that did not come out of it.

use thiserror::Error;

pub mod archive;
pub mod catalog;
pub mod mutate;
pub mod sandbox;
pub mod search;

pub use archive::{Archive, Archiver};
pub use catalog::Catalog;
pub use mutate::{Mutator, RemovedKind, UploadItem};
pub use sandbox::Sandbox;
pub use search::Finder;

/// Errors produced by the filesystem engine.
///
/// Request-time errors carry client-supplied path tokens or bare names only,
/// never absolute host paths; startup errors ([`Sandbox::open`]) may name the
/// offending host path since they never cross the API.
#[derive(Debug, Error)]
pub enum FsError {
    /// Sandbox violation or malformed path input. Carries no detail about
    /// which check failed.
    #[error("path is outside the managed directory")]
    InvalidPath,

    /// Target absent at operation time.
    #[error("'{0}' does not exist")]
    NotFound(String),

    /// Operation requires a directory.
    #[error("'{0}' is not a directory")]
    NotADirectory(String),

    /// Operation requires a file.
    #[error("'{0}' is a directory")]
    IsADirectory(String),

    /// Destination already occupied.
    #[error("'{0}' already exists")]
    Conflict(String),

    /// Attempted to move a directory into its own subtree.
    #[error("cannot move '{0}' into itself")]
    SelfMove(String),

    /// Source already lives in the destination folder.
    #[error("'{0}' is already in this folder")]
    AlreadyThere(String),

    /// Permission or device-level failure from the host filesystem.
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for FsError {
    fn from(err: zip::result::ZipError) -> Self {
        FsError::Io(err.into())
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, FsError>;
