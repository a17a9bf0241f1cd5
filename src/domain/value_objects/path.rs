//! Relative Path Value Object
//!
//! Every path handed to a location is relative to that location's root.
//! `RelativePath` guarantees:
//! - No path traversal (a normalized path never starts with `..`)
//! - No absolute paths (leading `/`, `\`, or a drive prefix)
//! - Forward slashes only, no `.` segments

use std::fmt;

/// Error when path validation fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path normalizes to somewhere above the root
    ContainsTraversal { path: String },
    /// Path is absolute when relative is required
    AbsoluteNotAllowed { path: String },
    /// Path is empty or normalizes to the root itself
    Empty,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::ContainsTraversal { path } => {
                write!(f, "Path '{}' escapes the location root", path)
            }
            PathError::AbsoluteNotAllowed { path } => {
                write!(f, "Absolute path '{}' is not allowed", path)
            }
            PathError::Empty => write!(f, "Path is empty"),
        }
    }
}

impl std::error::Error for PathError {}

/// A validated, normalized relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(String);

impl RelativePath {
    /// Validate and normalize a path.
    ///
    /// Backslashes become forward slashes and `a/../b` collapses to `b`
    /// lexically. Anything that still climbs above the root is rejected.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let unified = raw.replace('\\', "/");

        if unified.starts_with('/') || has_drive_prefix(&unified) {
            return Err(PathError::AbsoluteNotAllowed {
                path: raw.to_string(),
            });
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PathError::ContainsTraversal {
                            path: raw.to_string(),
                        });
                    }
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(PathError::Empty);
        }

        Ok(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parent directory, or `None` for a top-level entry.
    pub fn parent(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(parent, _)| parent)
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Number of segments, used to order deletions deepest first.
    pub fn depth(&self) -> usize {
        self.0.matches('/').count() + 1
    }
}

/// Normalize separators without validating. Used for listing keys.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for RelativePath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
