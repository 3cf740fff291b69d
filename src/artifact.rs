//! Temp-file-then-rename writes for generated artifacts.
//!
//! A [`PendingWrite`] holds the full contents in a temporary file next to
//! its destination. Nothing is visible at the destination until
//! [`PendingWrite::commit`], which is a single rename on the same filesystem.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Contents written to a temp file, waiting to be renamed into place.
#[derive(Debug)]
pub struct PendingWrite {
    temp: NamedTempFile,
    dest: PathBuf,
}

impl PendingWrite {
    /// Write `contents` to a temp file in `dest`'s directory, creating it if needed.
    ///
    /// When `dest` already exists its permissions are carried over.
    pub fn prepare(dest: &Path, contents: &[u8]) -> Result<Self> {
        let write_err = |source| Error::Write {
            path: dest.to_path_buf(),
            source,
        };

        let dir = match dest.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(write_err)?;

        let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
        temp.write_all(contents).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;

        if let Ok(meta) = fs::metadata(dest) {
            fs::set_permissions(temp.path(), meta.permissions()).map_err(write_err)?;
        }

        Ok(PendingWrite {
            temp,
            dest: dest.to_path_buf(),
        })
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Rename the temp file over the destination.
    pub fn commit(self) -> Result<PathBuf> {
        let PendingWrite { temp, dest } = self;
        temp.persist(&dest).map_err(|e| Error::Write {
            path: dest.clone(),
            source: e.error,
        })?;
        Ok(dest)
    }
}

/// Prepare and commit in one step.
pub fn write_atomic(dest: &Path, contents: &[u8]) -> Result<PathBuf> {
    PendingWrite::prepare(dest, contents)?.commit()
}
