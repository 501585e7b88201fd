//! File discovery module for report corpora
//!
//! Walks a directory tree and collects every supported report file in a
//! deterministic order.

use crate::constants::{TEMP_FILE_PREFIX, is_supported_extension};
use crate::error::{CapacityError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File discovery component for report corpora
#[derive(Debug)]
pub struct FileDiscovery {
    root: PathBuf,
    temp_files_skipped: usize,
}

impl FileDiscovery {
    /// Create a new file discovery instance
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            temp_files_skipped: 0,
        }
    }

    /// Word processor lock files seen during the last walk
    pub fn temp_files_skipped(&self) -> usize {
        self.temp_files_skipped
    }

    /// Discover all report files below the root
    ///
    /// Extensions match case-insensitively, paths are deduplicated by their
    /// canonical form and the result is sorted.
    pub fn discover_report_files(&mut self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(CapacityError::InputNotFound {
                path: self.root.clone(),
            });
        }

        debug!("Searching for report files in: {}", self.root.display());

        let mut files = BTreeSet::new();
        self.temp_files_skipped = 0;

        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !is_report_file(path) {
                continue;
            }

            if is_temp_file(path) {
                debug!("Skipping temp file: {}", path.display());
                self.temp_files_skipped += 1;
                continue;
            }

            let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            files.insert(canonical);
        }

        debug!(
            "Found {} report files ({} temp files skipped)",
            files.len(),
            self.temp_files_skipped
        );

        Ok(files.into_iter().collect())
    }
}

/// Check if a path has a supported report extension
fn is_report_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(is_supported_extension)
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(TEMP_FILE_PREFIX))
}
