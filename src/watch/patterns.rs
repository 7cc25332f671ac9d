// src/watch/patterns.rs

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result as AnyResult;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::{PipewatchError, Result};
use crate::fs::FileSystem;
use crate::watch::filter::IgnoreFilter;
use crate::watch::path_utils::to_forward_slashes;

/// A compiled set of glob patterns matched against root-relative paths.
///
/// Matching rules:
/// - case-insensitive;
/// - dot-files are matched like any other file (`*` matches `.env`);
/// - `\` in patterns is read as a path separator, not an escape;
/// - a pattern without `/` is also matched against the base name, so `*.css`
///   matches both `a.css` and `styles/a.css`.
#[derive(Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    full: GlobSet,
    base: GlobSet,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSet")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl PatternSet {
    /// Compile `patterns`, failing on the first malformed one.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut full = GlobSetBuilder::new();
        let mut base = GlobSetBuilder::new();
        let mut kept = Vec::new();

        for pat in patterns {
            let raw = pat.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            let normalized = to_forward_slashes(raw);
            let normalized = normalized.strip_prefix("./").unwrap_or(&normalized).to_string();

            let glob = GlobBuilder::new(&normalized)
                .case_insensitive(true)
                .literal_separator(true)
                .backslash_escape(false)
                .build()
                .map_err(|source| PipewatchError::InvalidGlob {
                    pattern: raw.to_string(),
                    source,
                })?;

            if !normalized.contains('/') {
                base.add(glob.clone());
            }
            full.add(glob);
            kept.push(raw.to_string());
        }

        let full = full.build().map_err(|source| PipewatchError::InvalidGlob {
            pattern: kept.join(", "),
            source,
        })?;
        let base = base.build().map_err(|source| PipewatchError::InvalidGlob {
            pattern: kept.join(", "),
            source,
        })?;

        Ok(Self {
            patterns: kept,
            full,
            base,
        })
    }

    /// A set that matches nothing.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            full: GlobSet::empty(),
            base: GlobSet::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The source patterns, as registered.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if the given root-relative path (e.g. `"src/a.css"`)
    /// matches any pattern.
    pub fn is_match(&self, rel_path: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let rel_path = to_forward_slashes(rel_path);
        if self.full.is_match(&rel_path) {
            return true;
        }
        match rel_path.rsplit_once('/') {
            Some((_, name)) => self.base.is_match(name),
            None => false,
        }
    }

    /// Keep the candidates that match this set, sorted and de-duplicated.
    pub fn select<'a, I>(&self, candidates: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        candidates
            .into_iter()
            .filter(|c| self.is_match(c))
            .cloned()
            .collect()
    }
}

/// Collect every file under `root` as a root-relative, forward-slash path.
///
/// Paths rejected by `ignore` are skipped; an ignored directory is not
/// descended into. The result is sorted.
pub fn walk_files(
    fs: &dyn FileSystem,
    root: &Path,
    ignore: &IgnoreFilter,
) -> AnyResult<Vec<String>> {
    let mut files = Vec::new();
    let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            let rel = match path.strip_prefix(root) {
                Ok(rel) => to_forward_slashes(&rel.to_string_lossy()),
                Err(_) => continue,
            };
            if ignore.is_ignored(&path, Some(&rel)) {
                continue;
            }
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(rel);
            }
        }
    }

    files.sort();
    Ok(files)
}
