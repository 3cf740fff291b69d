//! Staging directories
//!
//! `serve` never touches the user's package: the tree is copied into a fresh
//! directory under the system temp dir and generation runs against the copy.
//! Build output (`target/`) and VCS metadata (`.git/`) at the package root
//! are not copied.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ulid::Ulid;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Top-level directories left out of a copy.
const SKIPPED_DIRS: &[&str] = &["target", ".git"];

/// A copy of a package living in its own directory.
#[derive(Debug)]
pub struct StagedTree {
    path: PathBuf,
    files: usize,
}

impl StagedTree {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of files copied.
    pub fn files(&self) -> usize {
        self.files
    }

    /// Remove the staging directory and everything in it.
    pub fn cleanup(self) -> Result<()> {
        tracing::debug!(dir = %self.path.display(), "removing staging directory");
        fs::remove_dir_all(&self.path).map_err(|e| Error::io(&self.path, e))
    }
}

/// Copy `src` into a new `doroute-<ulid>` directory under the system temp dir.
pub fn stage_tree(src: &Path) -> Result<StagedTree> {
    let name = format!("doroute-{}", Ulid::new().to_string().to_lowercase());
    stage_tree_into(src, &env::temp_dir().join(name))
}

/// Copy `src` into `dest`, creating it if needed. Existing files are overwritten.
///
/// # Errors
///
/// [`Error::Stage`] when `src` is not a directory, when `dest` lies inside
/// `src`, or when any entry fails to copy.
pub fn stage_tree_into(src: &Path, dest: &Path) -> Result<StagedTree> {
    let stage_err = |message: String| Error::Stage {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        message,
    };

    if !src.is_dir() {
        return Err(stage_err("source is not a directory".to_string()));
    }
    fs::create_dir_all(dest).map_err(|e| stage_err(e.to_string()))?;

    let src_abs = fs::canonicalize(src).map_err(|e| stage_err(e.to_string()))?;
    let dest_abs = fs::canonicalize(dest).map_err(|e| stage_err(e.to_string()))?;
    if dest_abs.starts_with(&src_abs) {
        return Err(stage_err("destination is inside the source tree".to_string()));
    }

    let walker = WalkDir::new(&src_abs)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() != 1
                || !(e.file_type().is_dir()
                    && e.file_name().to_str().is_some_and(|n| SKIPPED_DIRS.contains(&n)))
        });

    let mut files = 0;
    for entry in walker {
        let entry = entry.map_err(|e| stage_err(e.to_string()))?;
        let rel = entry
            .path()
            .strip_prefix(&src_abs)
            .map_err(|e| stage_err(e.to_string()))?;
        let target = dest_abs.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| stage_err(e.to_string()))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)
                .map_err(|e| stage_err(format!("{}: {e}", rel.display())))?;
            files += 1;
        }
    }

    tracing::debug!(src = %src_abs.display(), dest = %dest_abs.display(), files, "staged tree");
    Ok(StagedTree {
        path: dest_abs,
        files,
    })
}
