//! Ignore patterns value object
//!
//! Decides which paths take no part in a sync, using gitignore semantics for
//! file and folder globs plus a plain extension list.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fmt;
use std::path::Path;

/// Maximum number of patterns allowed
const MAX_PATTERNS: usize = 1000;

/// Compiled ignore rules for one website tree.
///
/// A path is ignored when any of these hold:
/// - a file pattern matches it (slash-less patterns match the file name at any depth)
/// - a folder pattern matches any of its segments
/// - its extension is listed
#[derive(Debug)]
pub struct IgnorePatterns {
    matcher: Gitignore,
    extensions: Vec<String>,
    pattern_count: usize,
}

impl Default for IgnorePatterns {
    fn default() -> Self {
        Self::empty()
    }
}

impl IgnorePatterns {
    /// Create an empty pattern set (matches nothing).
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
            extensions: Vec::new(),
            pattern_count: 0,
        }
    }

    /// Build the rules from the three configured lists.
    pub fn from_rules(
        files: &[String],
        folders: &[String],
        extensions: &[String],
    ) -> Result<Self, IgnoreError> {
        let mut builder = GitignoreBuilder::new("");
        let mut pattern_count = 0;

        for pattern in files.iter().chain(folders.iter()) {
            let trimmed = pattern.trim();
            if trimmed.is_empty() {
                continue;
            }

            pattern_count += 1;
            if pattern_count > MAX_PATTERNS {
                return Err(IgnoreError::TooManyPatterns {
                    count: pattern_count,
                    limit: MAX_PATTERNS,
                });
            }

            if let Err(e) = builder.add_line(None, trimmed) {
                return Err(IgnoreError::InvalidPattern {
                    pattern: trimmed.to_string(),
                    message: e.to_string(),
                });
            }
        }

        let matcher = builder
            .build()
            .map_err(|e| IgnoreError::BuildFailed(e.to_string()))?;

        let extensions = extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        Ok(Self {
            matcher,
            extensions,
            pattern_count,
        })
    }

    /// Check if a forward-slash relative file path should be ignored.
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        let path = Path::new(rel_path);

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_ascii_lowercase();
            if self.extensions.iter().any(|listed| *listed == ext) {
                return true;
            }
        }

        self.pattern_count > 0
            && self
                .matcher
                .matched_path_or_any_parents(path, false)
                .is_ignore()
    }

    /// Get the number of glob patterns loaded.
    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }

    pub fn is_empty(&self) -> bool {
        self.pattern_count == 0 && self.extensions.is_empty()
    }
}

/// Errors that can occur when compiling ignore rules.
#[derive(Debug)]
pub enum IgnoreError {
    TooManyPatterns { count: usize, limit: usize },
    InvalidPattern { pattern: String, message: String },
    BuildFailed(String),
}

impl fmt::Display for IgnoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreError::TooManyPatterns { count, limit } => {
                write!(f, "too many ignore patterns ({} > {})", count, limit)
            }
            IgnoreError::InvalidPattern { pattern, message } => {
                write!(f, "invalid ignore pattern '{}': {}", pattern, message)
            }
            IgnoreError::BuildFailed(message) => {
                write!(f, "failed to build ignore rules: {}", message)
            }
        }
    }
}

impl std::error::Error for IgnoreError {}
