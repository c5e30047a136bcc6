// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Project file enumeration for dependency usage checks.

use std::{
    fs,
    path::{Path, PathBuf}
};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Files larger than this are never read.
pub const MAX_SCAN_BYTES: u64 = 200 * 1024;

/// Directories that never contain first-party sources.
const EXCLUDED_DIRS: &[&str] =
    &["node_modules", ".git", "dist", "build", "coverage", "target", ".next", ".cache"];

/// Manifests and lock files list every dependency by name.
const EXCLUDED_FILES: &[&str] =
    &["package.json", "package-lock.json", "npm-shrinkwrap.json", "yarn.lock", "pnpm-lock.yaml"];

const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx", "vue", "svelte", "html", "css", "scss",
    "yml", "yaml", "sh"
];

/// A text file read during a usage scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Location of the file.
    pub path:     PathBuf,
    /// UTF-8 contents.
    pub contents: String
}

/// Source of project files for the acknowledgments usage check.
pub trait FileScanner {
    /// Returns the text files below `root`.
    ///
    /// Enumeration is best-effort: unreadable entries are skipped.
    fn scan(&self, root: &Path) -> Vec<ScannedFile>;
}

/// Recursive directory walk honouring the exclusion rules and size ceiling.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkScanner;

impl FileScanner for WalkScanner {
    fn scan(&self, root: &Path) -> Vec<ScannedFile> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| !is_excluded_dir(entry));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    debug!("skipping unreadable entry: {error}");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                continue;
            }

            let too_large =
                entry.metadata().map(|meta| meta.len() > MAX_SCAN_BYTES).unwrap_or(true);
            if too_large {
                debug!("skipping {} (size ceiling)", entry.path().display());
                continue;
            }

            match fs::read_to_string(entry.path()) {
                Ok(contents) => files.push(ScannedFile {
                    path: entry.into_path(),
                    contents
                }),
                Err(error) => debug!("skipping {}: {error}", entry.path().display())
            }
        }

        files
    }
}

fn is_excluded_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

fn is_source_file(path: &Path) -> bool {
    let excluded = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| EXCLUDED_FILES.contains(&name));
    let source = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
    source && !excluded
}
