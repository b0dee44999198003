//! `.cfignore` documents and a local model of which files get uploaded.
//!
//! Pattern rules:
//! - `dir/` matches the directory and everything beneath it
//! - a pattern without a leading `/` matches at any depth
//! - a leading `/` anchors the pattern to the app root
//! - `*` never crosses a path separator; `**` does
//!
//! [`DEFAULT_IGNORED`] always applies, with or without a `.cfignore`.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::FixtureError;

/// File name of the ignore document.
pub const IGNORE_FILE: &str = ".cfignore";

/// Entries the CLI never uploads. The app's own `.cfignore` and
/// `manifest.yml` are only skipped at the root.
pub const DEFAULT_IGNORED: &[&str] = &[
    "/.cfignore",
    "_darcs",
    ".DS_Store",
    ".git",
    ".gitignore",
    ".hg",
    "/manifest.yml",
    ".svn",
];

/// The lines of a `.cfignore`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    patterns: Vec<String>,
}

impl IgnoreList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses raw `.cfignore` bytes.
    ///
    /// Bytes that are not UTF-8 are replaced, blank lines and `#` comments
    /// are dropped. A line with replaced bytes stays in the list; it simply
    /// never matches a real file.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        )
    }

    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Renders the document, one pattern per line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for pattern in &self.patterns {
            out.push_str(pattern);
            out.push('\n');
        }
        out
    }
}

/// Compiled matcher over the defaults plus an [`IgnoreList`].
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    set: GlobSet,
    dirs: GlobSet,
    skipped: Vec<String>,
}

impl IgnoreMatcher {
    /// Compiles the list; patterns that fail to compile are skipped.
    #[must_use]
    pub fn new(list: &IgnoreList) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut dir_builder = GlobSetBuilder::new();
        let mut skipped = Vec::new();

        let patterns = DEFAULT_IGNORED
            .iter()
            .copied()
            .chain(list.patterns().iter().map(String::as_str));
        for pattern in patterns {
            match expand(pattern) {
                Ok(expanded) => {
                    for glob in expanded.any {
                        builder.add(glob);
                    }
                    for glob in expanded.dirs {
                        dir_builder.add(glob);
                    }
                }
                Err(e) => {
                    warn!(pattern, error = %e, "skipping ignore pattern");
                    skipped.push(pattern.to_string());
                }
            }
        }

        let set = builder.build().unwrap_or_else(|e| {
            warn!(error = %e, "ignore set failed to build, nothing will be ignored");
            GlobSet::empty()
        });
        let dirs = dir_builder.build().unwrap_or_else(|e| {
            warn!(error = %e, "directory ignore set failed to build");
            GlobSet::empty()
        });
        Self { set, dirs, skipped }
    }

    /// True if the file at `relative` (relative to the app root) would not be
    /// uploaded.
    #[must_use]
    pub fn is_ignored(&self, relative: &Path) -> bool {
        !relative.as_os_str().is_empty() && self.set.is_match(relative)
    }

    /// True if the directory at `relative` is skipped as a whole. Patterns
    /// ending in `/` only ever match directories.
    #[must_use]
    pub fn is_ignored_dir(&self, relative: &Path) -> bool {
        self.is_ignored(relative) || self.dirs.is_match(relative)
    }

    /// Patterns that could not be compiled.
    #[must_use]
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

/// Globs compiled from one ignore line.
struct Expanded {
    /// Match any entry.
    any: Vec<globset::Glob>,
    /// Match directories only.
    dirs: Vec<globset::Glob>,
}

fn expand(pattern: &str) -> Result<Expanded, globset::Error> {
    let dir_only = pattern.ends_with('/');
    let trimmed = pattern.trim_end_matches('/');
    let (anchored, body) = match trimmed.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let mut expanded = Expanded {
        any: Vec::new(),
        dirs: Vec::new(),
    };
    if body.is_empty() {
        return Ok(expanded);
    }

    let roots = if anchored {
        vec![body.to_string()]
    } else {
        vec![body.to_string(), format!("**/{body}")]
    };
    let glob = |s: &str| GlobBuilder::new(s).literal_separator(true).build();
    for root in &roots {
        expanded.any.push(glob(&format!("{root}/**"))?);
        if dir_only {
            expanded.dirs.push(glob(root)?);
        } else {
            expanded.any.push(glob(root)?);
        }
    }
    Ok(expanded)
}

/// Lists the files under `root` that survive the defaults and `list`.
///
/// Paths are relative, `/`-separated and sorted. Ignored directories are not
/// descended into.
pub fn packaged_files(root: &Path, list: &IgnoreList) -> Result<Vec<String>, FixtureError> {
    let matcher = IgnoreMatcher::new(list);
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let path = relative(root, entry.path());
            entry.depth() == 0
                || if entry.file_type().is_dir() {
                    !matcher.is_ignored_dir(&path)
                } else {
                    !matcher.is_ignored(&path)
                }
        });
    for entry in walker {
        let entry = entry.map_err(|source| FixtureError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(to_slash(&relative(root, entry.path())));
        }
    }
    files.sort();
    Ok(files)
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
