//! On-demand zip packaging of a folder subtree.
//!
//! The archive is staged in an unlinked temp file rather than memory, so an
//! arbitrarily large folder never inflates the process heap. The temp path is
//! deleted as soon as the handle is open; the kernel reclaims the blocks when
//! the last reader drops the handle.

use std::fs::{self, File};
use std::io::{self, Seek};

use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::sandbox::slash_path;
use super::{FsError, Result, Sandbox};

/// Entry prefix when the folder name cannot be expressed as UTF-8 or the
/// target is the storage root itself.
const FALLBACK_ARCHIVE_STEM: &str = "archive";

/// A finished archive, rewound and ready to stream.
#[derive(Debug)]
pub struct Archive {
    /// Handle to the unlinked staging file, positioned at the start.
    pub file: File,
    /// Suggested download name, `<folder>.zip`.
    pub file_name: String,
    /// Total archive size in bytes.
    pub size: u64,
}

/// Builds deflate-compressed zip archives of sandboxed folders.
#[derive(Debug, Clone)]
pub struct Archiver {
    sandbox: Sandbox,
}

impl Archiver {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }

    /// Package the folder at `client_path` into a zip archive.
    ///
    /// Every regular file in the subtree is included, hidden ones too, each
    /// under `<folder>/<relative path>`. Empty subfolders carry no entry.
    pub fn build(&self, client_path: &str) -> Result<Archive> {
        let dir = self.sandbox.resolve(client_path)?;
        let metadata = match fs::metadata(&dir) {
            Ok(m) => m,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(FsError::NotFound(client_path.to_string()))
            }
            Err(err) => return Err(err.into()),
        };
        if !metadata.is_dir() {
            return Err(FsError::NotADirectory(client_path.to_string()));
        }

        let stem = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_ARCHIVE_STEM.to_string());

        let (staging, temp_path) = tempfile::NamedTempFile::new()?.into_parts();
        let mut writer = ZipWriter::new(staging);
        let options: FileOptions<'_, ()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut entries = 0usize;
        for entry in WalkDir::new(&dir).follow_links(false).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry while archiving");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = match entry.path().strip_prefix(&dir) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            let entry_name = format!("{stem}/{}", slash_path(relative));
            writer.start_file(entry_name, options)?;
            let mut source = File::open(entry.path())?;
            io::copy(&mut source, &mut writer)?;
            entries += 1;
        }

        let mut file = writer.finish()?;
        let size = file.metadata()?.len();
        file.rewind()?;

        // Unlink now so nothing lingers in the temp dir; the open handle
        // keeps the data alive until the response is fully streamed.
        if let Err(err) = temp_path.close() {
            tracing::warn!(error = %err, "could not unlink archive staging file");
        }

        tracing::info!(folder = %client_path, entries, size, "archive built");
        Ok(Archive {
            file,
            file_name: format!("{stem}.zip"),
            size,
        })
    }
}
